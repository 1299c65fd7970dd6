// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::types::{JsxEmit, LibName, ScriptTarget};
use crate::vpath::normalize_path;

/// Exclusions applied when no config in the chain declares `exclude`.
pub const DEFAULT_EXCLUDE: [&str; 4] = ["node_modules", "bower_components", "jspm_packages", ".git"];

/// Extra exclusion used when resolving compiler inputs.
pub const DECLARATION_GLOB: &str = "**/*.d.ts";

/// `compilerOptions` as read from the config file.
///
/// The options this crate interprets are typed; everything else is kept
/// verbatim in `extra` and forwarded to the compiler.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    pub target: Option<ScriptTarget>,
    pub jsx: Option<JsxEmit>,
    pub lib: Option<Vec<LibName>>,
    pub root_dir: Option<String>,
    pub out_dir: Option<String>,
    pub allow_js: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CompilerOptions {
    /// `self` layered over `parent`, key by key.
    pub fn merged_over(&self, parent: &CompilerOptions) -> CompilerOptions {
        let mut extra = parent.extra.clone();
        extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        CompilerOptions {
            target: self.target.or(parent.target),
            jsx: self.jsx.or(parent.jsx),
            lib: self.lib.clone().or_else(|| parent.lib.clone()),
            root_dir: self.root_dir.clone().or_else(|| parent.root_dir.clone()),
            out_dir: self.out_dir.clone().or_else(|| parent.out_dir.clone()),
            allow_js: self.allow_js.or(parent.allow_js),
            extra,
        }
    }

    pub fn allow_js(&self) -> bool {
        self.allow_js.unwrap_or(false)
    }
}

/// Top-level shape of a `tsconfig.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
    pub include: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub extends: Option<String>,
}

/// One node of an extends chain.
///
/// Values are never cached: every derived accessor walks the chain again, so
/// a model is cheap to build and always consistent with its parent.
#[derive(Debug, Clone)]
pub struct ConfigModel {
    base_path: PathBuf,
    config_name: String,
    compiler_options: CompilerOptions,
    include: Option<Vec<String>>,
    files: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    parent: Option<Arc<ConfigModel>>,
}

impl ConfigModel {
    pub fn new(
        base_path: impl AsRef<Path>,
        config_name: impl Into<String>,
        raw: RawConfig,
        parent: Option<Arc<ConfigModel>>,
    ) -> Self {
        Self {
            base_path: normalize_path(base_path.as_ref()),
            config_name: config_name.into(),
            compiler_options: raw.compiler_options,
            include: raw.include,
            files: raw.files,
            exclude: raw.exclude,
            parent,
        }
    }

    /// Directory holding the config file.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.base_path.join(&self.config_name)
    }

    pub fn parent(&self) -> Option<&ConfigModel> {
        self.parent.as_deref()
    }

    /// Config files from this node up to the root of the chain.
    pub fn chain(&self) -> Vec<PathBuf> {
        let mut out = vec![self.config_file_path()];
        let mut cur = self.parent();
        while let Some(node) = cur {
            out.push(node.config_file_path());
            cur = node.parent();
        }
        out
    }

    /// Options declared by this node alone.
    pub fn own_compiler_options(&self) -> &CompilerOptions {
        &self.compiler_options
    }

    /// Effective options: the parent's effective options overridden by ours.
    pub fn compiler_options(&self) -> CompilerOptions {
        match self.parent() {
            Some(parent) => self.compiler_options.merged_over(&parent.compiler_options()),
            None => self.compiler_options.clone(),
        }
    }

    /// `base_path` + `rootDir` (default `.`).
    pub fn root_path(&self) -> PathBuf {
        let opts = self.compiler_options();
        self.resolve_dir(opts.root_dir.as_deref())
    }

    /// `base_path` + `outDir` (default `.`).
    pub fn out_path(&self) -> PathBuf {
        let opts = self.compiler_options();
        self.resolve_dir(opts.out_dir.as_deref())
    }

    /// True when some config in the chain declares `outDir`.
    pub fn is_out_dir(&self) -> bool {
        self.compiler_options().out_dir.is_some()
    }

    pub fn excluded(&self) -> Vec<String> {
        self.inherited(|c| c.exclude.as_ref())
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect())
    }

    pub fn include(&self) -> Option<Vec<String>> {
        self.inherited(|c| c.include.as_ref())
    }

    pub fn files(&self) -> Option<Vec<String>> {
        self.inherited(|c| c.files.as_ref())
    }

    pub fn default_exclude(&self) -> Vec<String> {
        vec![DECLARATION_GLOB.to_string()]
    }

    /// Include globs used when neither `include` nor `files` is declared.
    pub fn default_include(&self) -> Vec<String> {
        self.allowed_extensions()
            .iter()
            .map(|ext| format!("**/*{ext}"))
            .collect()
    }

    /// Source extensions the compiler picks up (`.ts`, `.tsx`, plus `.js`,
    /// `.jsx` under `allowJs`).
    pub fn allowed_extensions(&self) -> Vec<String> {
        let mut exts = vec![".ts".to_string(), ".tsx".to_string()];
        if self.compiler_options().allow_js() {
            exts.push(".js".to_string());
            exts.push(".jsx".to_string());
        }
        exts
    }

    /// Effective options with `rootDir`/`outDir` made absolute, ready for the
    /// compiler.
    pub fn resolved_compiler_options(&self) -> CompilerOptions {
        let mut opts = self.compiler_options();
        opts.root_dir = Some(self.root_path().to_string_lossy().into_owned());
        opts.out_dir = Some(self.out_path().to_string_lossy().into_owned());
        opts
    }

    fn inherited<F>(&self, pick: F) -> Option<Vec<String>>
    where
        F: Fn(&ConfigModel) -> Option<&Vec<String>>,
    {
        let mut cur = Some(self);
        while let Some(node) = cur {
            if let Some(list) = pick(node) {
                return Some(list.clone());
            }
            cur = node.parent();
        }
        None
    }

    pub(crate) fn resolve_dir(&self, dir: Option<&str>) -> PathBuf {
        normalize_path(&self.base_path.join(dir.unwrap_or(".")))
    }

    /// Make `path` absolute against the root directory.
    pub(crate) fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.root_path().join(path))
        }
    }
}
