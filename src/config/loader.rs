// src/config/loader.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::jsonc;
use crate::config::model::{ConfigModel, RawConfig};
use crate::errors::{Result, TscUtilError};
use crate::fs::FileSystem;
use crate::vpath::normalize_path;

/// A config file located on disk, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Directory the file was actually found in.
    pub base_path: PathBuf,
    pub config_name: String,
    pub content: String,
}

impl ResolvedConfig {
    pub fn file_path(&self) -> PathBuf {
        self.base_path.join(&self.config_name)
    }
}

/// Read `base_path/name`, walking upward on "not found" when `recursive`.
///
/// Read errors other than "not found" are returned unchanged.
pub fn resolve_config_path(
    fs: &dyn FileSystem,
    name: &str,
    base_path: &Path,
    recursive: bool,
) -> Result<ResolvedConfig> {
    let start = normalize_path(base_path);
    let mut dir = start.clone();
    loop {
        let candidate = dir.join(name);
        trace!(path = %candidate.display(), "looking for config");
        match fs.read_to_string(&candidate) {
            Ok(content) => {
                let (base_path, config_name) = split_file(&candidate, name);
                return Ok(ResolvedConfig {
                    base_path,
                    config_name,
                    content,
                });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let parent = dir.parent().map(Path::to_path_buf);
                match parent {
                    Some(parent) if recursive && parent != dir => dir = parent,
                    _ => {
                        return Err(TscUtilError::ConfigNotFound {
                            name: name.to_string(),
                            start,
                        });
                    }
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Locate, parse and chain a config file and everything it `extends`.
pub fn load_config(
    fs: &dyn FileSystem,
    name: &str,
    base_path: &Path,
    recursive: bool,
) -> Result<ConfigModel> {
    let mut visited = Vec::new();
    load_chained(fs, name, base_path, recursive, &mut visited)
}

/// Parse raw config text (JSON with comments).
pub fn parse_config(path: &Path, content: &str) -> Result<RawConfig> {
    let json = jsonc::strip(content);
    serde_json::from_str(&json).map_err(|source| TscUtilError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_chained(
    fs: &dyn FileSystem,
    name: &str,
    base_path: &Path,
    recursive: bool,
    visited: &mut Vec<PathBuf>,
) -> Result<ConfigModel> {
    let resolved = resolve_config_path(fs, name, base_path, recursive)?;
    let file_path = resolved.file_path();

    if visited.contains(&file_path) {
        let mut chain = visited.clone();
        chain.push(file_path);
        return Err(TscUtilError::ConfigCycle { chain });
    }
    visited.push(file_path.clone());

    let raw = parse_config(&file_path, &resolved.content)?;
    debug!(
        config = %file_path.display(),
        extends = raw.extends.as_deref().unwrap_or("-"),
        "loaded config"
    );

    let parent = match raw.extends.as_deref() {
        Some(reference) => {
            let parent_file = resolve_extends(fs, &resolved.base_path, reference);
            let (parent_dir, parent_name) = split_file(&parent_file, reference);
            Some(Arc::new(load_chained(
                fs,
                &parent_name,
                &parent_dir,
                false,
                visited,
            )?))
        }
        None => None,
    };

    Ok(ConfigModel::new(
        &resolved.base_path,
        resolved.config_name,
        raw,
        parent,
    ))
}

/// Where an `extends` reference points.
///
/// Relative and absolute references resolve against `base`; bare package
/// references are looked up under `node_modules` from `base` upward. `.json`
/// is appended when the reference has no extension.
fn resolve_extends(fs: &dyn FileSystem, base: &Path, reference: &str) -> PathBuf {
    let mut reference = reference.to_string();
    if Path::new(&reference).extension().is_none() {
        reference.push_str(".json");
    }

    let is_path = reference.starts_with("./")
        || reference.starts_with("../")
        || Path::new(&reference).is_absolute();
    if is_path {
        return normalize_path(&base.join(&reference));
    }

    let mut dir = Some(base);
    while let Some(current) = dir {
        let candidate = normalize_path(&current.join("node_modules").join(&reference));
        if fs.is_file(&candidate) {
            return candidate;
        }
        dir = current.parent();
    }
    normalize_path(&base.join("node_modules").join(&reference))
}

fn split_file(path: &Path, fallback_name: &str) -> (PathBuf, String) {
    let dir = path
        .parent()
        .map(normalize_path)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback_name.to_string());
    (dir, name)
}

