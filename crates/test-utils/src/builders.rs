#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tempfile::TempDir;
use tsc_util::config::{ConfigModel, RawConfig};

/// Builder for `tsconfig.json` documents.
#[derive(Debug, Clone, Default)]
pub struct TsConfigBuilder {
    compiler_options: Map<String, Value>,
    top: Map<String, Value>,
}

impl TsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(mut self, key: &str, value: Value) -> Self {
        self.compiler_options.insert(key.to_string(), value);
        self
    }

    pub fn root_dir(self, dir: &str) -> Self {
        self.option("rootDir", json!(dir))
    }

    pub fn out_dir(self, dir: &str) -> Self {
        self.option("outDir", json!(dir))
    }

    pub fn allow_js(self, allow: bool) -> Self {
        self.option("allowJs", json!(allow))
    }

    pub fn include(mut self, patterns: &[&str]) -> Self {
        self.top.insert("include".to_string(), json!(patterns));
        self
    }

    pub fn exclude(mut self, patterns: &[&str]) -> Self {
        self.top.insert("exclude".to_string(), json!(patterns));
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.top.insert("files".to_string(), json!(files));
        self
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.top.insert("extends".to_string(), json!(parent));
        self
    }

    pub fn to_value(&self) -> Value {
        let mut doc = self.top.clone();
        if !self.compiler_options.is_empty() {
            doc.insert(
                "compilerOptions".to_string(),
                Value::Object(self.compiler_options.clone()),
            );
        }
        Value::Object(doc)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).expect("config serializes")
    }

    pub fn build_raw(&self) -> RawConfig {
        serde_json::from_value(self.to_value()).expect("config deserializes")
    }

    /// Parentless model rooted at `base`.
    pub fn model(&self, base: impl AsRef<Path>) -> ConfigModel {
        ConfigModel::new(base, "tsconfig.json", self.build_raw(), None)
    }

    /// Model rooted at `base` that extends `parent`.
    pub fn model_with_parent(&self, base: impl AsRef<Path>, parent: ConfigModel) -> ConfigModel {
        ConfigModel::new(base, "tsconfig.json", self.build_raw(), Some(Arc::new(parent)))
    }
}

/// A project tree in a temporary directory.
pub struct ProjectTree {
    dir: TempDir,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Canonical root, so paths compare equal to what the OS reports.
    pub fn root(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .unwrap_or_else(|_| self.dir.path().to_path_buf())
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn file(self, rel: &str, contents: &str) -> Self {
        self.write(rel, contents);
        self
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write file");
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.path(rel)).ok()
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}
