// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TscUtilError {
    #[error("Config file {name} not found searching upward from {start:?}")]
    ConfigNotFound { name: String, start: PathBuf },

    #[error("Config parse error in {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cycle detected in extends chain: {}", format_chain(.chain))]
    ConfigCycle { chain: Vec<PathBuf> },

    #[error("Invalid glob pattern: {0:?}")]
    InvalidPattern(String),

    #[error("Invalid path: path must not be empty")]
    InvalidPath,

    #[error("No watch route for path: {0:?}")]
    UnroutedPath(PathBuf),

    #[error("Compiler error: {0}")]
    CompilerError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Glob error: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, TscUtilError>;
