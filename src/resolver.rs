// src/resolver.rs

//! Which files are in the build, and which are copied through.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigModel;
use crate::errors::Result;
use crate::finder::{FileFinder, FindOptions};
use crate::glob::{GlobSpec, WATCH_EXTENSIONS};
use crate::vpath::{normalize_path, to_virtual};

/// Patterns for pass-through files (already compiled scripts and declarations).
pub const AUXILIARY_PATTERNS: [&str; 2] = ["**/*.d.ts", "**/*.js"];

/// Include/exclude globs derived from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFileSpec {
    pub root_path: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Composes the config with the glob translator and the finder.
#[derive(Debug, Clone)]
pub struct FileSetResolver {
    config: Arc<ConfigModel>,
    finder: FileFinder,
}

impl FileSetResolver {
    pub fn new(config: Arc<ConfigModel>, finder: FileFinder) -> Self {
        Self { config, finder }
    }

    pub fn config(&self) -> &ConfigModel {
        &self.config
    }

    pub fn config_arc(&self) -> Arc<ConfigModel> {
        Arc::clone(&self.config)
    }

    /// Absolute include/exclude globs for the compiler's inputs.
    ///
    /// Without `include` and `files` the default source globs are used;
    /// otherwise each include entry is translated and the `files` entries are
    /// appended as they are (anchored at the config directory).
    pub fn included_file_spec(&self, use_default_exclude: bool) -> Result<IncludedFileSpec> {
        let cfg = &self.config;
        let base = cfg.base_path();
        let allow_js = cfg.compiler_options().allow_js();

        let mut exclude = Vec::new();
        if let Some(out) = self.out_dir_exclusion() {
            exclude.push(out);
        }
        for entry in cfg.excluded() {
            exclude.push(GlobSpec::new(&entry, base)?.to_exclude_glob(true));
        }
        if use_default_exclude {
            for entry in cfg.default_exclude() {
                exclude.push(GlobSpec::new(&entry, base)?.to_exclude_glob(true));
            }
        }

        let include_list = cfg.include();
        let files = cfg.files();
        let mut include = Vec::new();
        if include_list.is_none() && files.is_none() {
            for entry in cfg.default_include() {
                include.push(GlobSpec::new(&entry, base)?.to_include_glob(true));
            }
        } else {
            for entry in include_list.unwrap_or_default() {
                let spec = GlobSpec::new(&entry, base)?.with_allow_js(allow_js);
                include.push(spec.to_include_glob(true));
            }
            for file in files.unwrap_or_default() {
                include.push(to_virtual(&normalize_path(&base.join(file))));
            }
        }

        Ok(IncludedFileSpec {
            root_path: cfg.root_path(),
            include,
            exclude,
        })
    }

    /// Absolute paths of the compiler's input files.
    pub async fn resolve_file_paths(&self) -> Result<Vec<PathBuf>> {
        let spec = self.included_file_spec(true)?;
        let files = self.find(&spec.include, spec.exclude, spec.root_path).await?;
        debug!(count = files.len(), "resolved compiler inputs");
        Ok(files)
    }

    /// Absolute paths of the pass-through files under the root directory.
    pub async fn resolve_auxiliary_file_paths(&self) -> Result<Vec<PathBuf>> {
        let spec = self.included_file_spec(false)?;
        let root = self.config.root_path();
        let include: Vec<String> = AUXILIARY_PATTERNS
            .iter()
            .map(|p| format!("{}/{p}", to_virtual(&root).trim_end_matches('/')))
            .collect();
        let files = self.find(&include, spec.exclude, root).await?;
        debug!(count = files.len(), "resolved pass-through files");
        Ok(files)
    }

    /// Watcher globs for pass-through files.
    ///
    /// Directory and wildcard include entries are watched for `.js`/`.d.ts`;
    /// file entries only when they carry one of those extensions. With neither
    /// `include` nor `files` the whole root is watched.
    pub fn watch_patterns(&self) -> Result<Vec<String>> {
        let cfg = &self.config;
        let base = cfg.base_path();
        let include = cfg.include();
        let files = cfg.files();

        if include.is_none() && files.is_none() {
            return Ok(GlobSpec::new("**", cfg.root_path())?
                .with_extensions(WATCH_EXTENSIONS)
                .to_watch_dir_paths(true));
        }

        let mut patterns = Vec::new();
        for entry in include.into_iter().flatten().chain(files.into_iter().flatten()) {
            let spec = GlobSpec::new(&entry, base)?.with_extensions(WATCH_EXTENSIONS);
            if spec.is_file_spec() && !WATCH_EXTENSIONS.iter().any(|ext| entry.ends_with(ext)) {
                continue;
            }
            for pattern in spec.to_watch_dir_paths(true) {
                if !patterns.contains(&pattern) {
                    patterns.push(pattern);
                }
            }
        }
        Ok(patterns)
    }

    /// Glob for the out directory when it sits inside the root directory.
    fn out_dir_exclusion(&self) -> Option<String> {
        let root = self.config.root_path();
        let out = self.config.out_path();
        (out != root && out.starts_with(&root)).then(|| format!("{}/**/*", to_virtual(&out)))
    }

    async fn find(&self, include: &[String], exclude: Vec<String>, cwd: PathBuf) -> Result<Vec<PathBuf>> {
        let options = FindOptions {
            cwd: Some(cwd),
            exclude,
            full_path: true,
        };
        self.finder.find(include, &options).await
    }
}
