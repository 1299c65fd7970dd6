// src/finder.rs

//! Glob-based file discovery used to build the compiler's file list.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::errors::{Result, TscUtilError};
use crate::fs::FileSystem;
use crate::glob::literal_prefix;
use crate::vpath::{normalize_path, relative_path, to_virtual};

/// Options for [`FileFinder::find`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Directory relative patterns are resolved against (process cwd if unset).
    pub cwd: Option<PathBuf>,
    /// Ignore globs, absolute or relative to `cwd`.
    pub exclude: Vec<String>,
    /// Return absolute paths instead of `cwd`-relative ones.
    pub full_path: bool,
}

/// Walks the filesystem for files matching a set of globs.
#[derive(Debug, Clone)]
pub struct FileFinder {
    fs: Arc<dyn FileSystem>,
}

/// Exclusions split by how they are matched.
#[derive(Debug)]
struct Excludes {
    absolute: GlobSet,
    relative: GlobSet,
}

impl Excludes {
    fn build(patterns: &[String]) -> Result<Self> {
        let mut absolute = GlobSetBuilder::new();
        let mut relative = GlobSetBuilder::new();
        for pat in patterns {
            let pat = clean_pattern(pat);
            let glob = GlobBuilder::new(&pat).literal_separator(true).build()?;
            if is_absolute_pattern(&pat) {
                absolute.add(glob);
            } else {
                relative.add(glob);
            }
        }
        Ok(Self {
            absolute: absolute.build()?,
            relative: relative.build()?,
        })
    }

    fn is_excluded(&self, abs: &str, rel: &str) -> bool {
        self.absolute.is_match(abs) || self.relative.is_match(rel)
    }

    /// A directory is skipped when it, or everything beneath it, is excluded.
    fn prunes(&self, abs: &str, rel: &str) -> bool {
        self.is_excluded(abs, rel) || self.is_excluded(&format!("{abs}/**"), &format!("{rel}/**"))
    }
}

/// One pattern resolved against `cwd`.
struct Walk<'a> {
    fs: &'a dyn FileSystem,
    cwd: &'a Path,
    matcher: GlobMatcher,
    absolute: bool,
    excludes: &'a Excludes,
}

impl Walk<'_> {
    fn rel_of(&self, path: &Path) -> String {
        match path.strip_prefix(self.cwd) {
            Ok(rel) => to_virtual(rel),
            Err(_) => to_virtual(&relative_path(self.cwd, path)),
        }
    }

    fn visit(&self, path: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        let abs = to_virtual(path);
        let rel = self.rel_of(path);

        if self.fs.is_dir(path) {
            if path != self.cwd && self.excludes.prunes(&abs, &rel) {
                trace!(dir = %abs, "pruned excluded directory");
                return Ok(());
            }
            let mut entries = match self.fs.read_dir(path) {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    trace!(dir = %abs, "directory vanished during walk");
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            entries.sort();
            for entry in entries {
                // Linked directories are not descended into.
                if self.fs.is_symlink(&entry) && self.fs.is_dir(&entry) {
                    trace!(dir = %entry.display(), "skipping linked directory");
                    continue;
                }
                self.visit(&entry, out)?;
            }
            return Ok(());
        }

        let key = if self.absolute { &abs } else { &rel };
        if self.fs.is_file(path) && self.matcher.is_match(key) && !self.excludes.is_excluded(&abs, &rel) {
            out.push(path.to_path_buf());
        }
        Ok(())
    }
}

impl FileFinder {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Resolve every pattern and return matching files, first-seen order,
    /// without duplicates.
    ///
    /// Patterns are walked concurrently on the blocking pool; results are
    /// collected in declaration order. The first failing pattern fails the
    /// whole call.
    pub async fn find(&self, patterns: &[String], options: &FindOptions) -> Result<Vec<PathBuf>> {
        let cwd = match &options.cwd {
            Some(cwd) => normalize_path(cwd),
            None => std::env::current_dir()?,
        };
        let excludes = Arc::new(Excludes::build(&options.exclude)?);
        debug!(cwd = %cwd.display(), patterns = ?patterns, exclude = ?options.exclude, "finding files");

        let mut handles = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = clean_pattern(pattern);
            let matcher = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()?
                .compile_matcher();
            let fs = Arc::clone(&self.fs);
            let cwd = cwd.clone();
            let excludes = Arc::clone(&excludes);
            handles.push(tokio::task::spawn_blocking(move || {
                find_one(fs.as_ref(), &cwd, &pattern, matcher, &excludes)
            }));
        }

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for handle in handles {
            let found = handle
                .await
                .map_err(|e| TscUtilError::Other(anyhow!("file walk task failed: {e}")))??;
            for path in found {
                let path = if options.full_path {
                    path
                } else {
                    path.strip_prefix(&cwd).map(Path::to_path_buf).unwrap_or(path)
                };
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }
        debug!(count = files.len(), "found files");
        Ok(files)
    }
}

fn find_one(
    fs: &dyn FileSystem,
    cwd: &Path,
    pattern: &str,
    matcher: GlobMatcher,
    excludes: &Excludes,
) -> Result<Vec<PathBuf>> {
    let absolute = is_absolute_pattern(pattern);
    let prefix = literal_prefix(pattern);
    let start = if absolute {
        normalize_path(Path::new(&prefix))
    } else {
        normalize_path(&cwd.join(&prefix))
    };

    let walk = Walk {
        fs,
        cwd,
        matcher,
        absolute,
        excludes,
    };
    let mut out = Vec::new();
    walk.visit(&start, &mut out)?;
    Ok(out)
}

fn clean_pattern(pattern: &str) -> String {
    let mut pattern = pattern;
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern.to_string()
}

fn is_absolute_pattern(pattern: &str) -> bool {
    pattern.starts_with('/') || Path::new(pattern).is_absolute()
}
