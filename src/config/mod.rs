// src/config/mod.rs

//! Project configuration: the `tsconfig.json` model and its loader.

pub mod jsonc;
pub mod loader;
pub mod model;
mod paths;

pub use loader::{load_config, resolve_config_path, ResolvedConfig};
pub use model::{CompilerOptions, ConfigModel, RawConfig};
