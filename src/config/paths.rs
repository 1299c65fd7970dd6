// src/config/paths.rs

//! Mapping between the root (source) tree and the out (output) tree.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::config::model::ConfigModel;
use crate::glob::GlobSpec;
use crate::vpath::{normalize_path, relative_path, to_virtual};

const RECURSIVE_SUFFIX: &str = "/**/*";

impl ConfigModel {
    /// `out_path` + the path of `file` relative to `root_path`.
    pub fn to_out_path(&self, file: &Path) -> PathBuf {
        let file = self.absolutize(file);
        let rel = relative_path(&self.root_path(), &file);
        normalize_path(&self.out_path().join(rel))
    }

    pub fn to_out_paths<P: AsRef<Path>>(&self, files: &[P]) -> Vec<PathBuf> {
        files.iter().map(|f| self.to_out_path(f.as_ref())).collect()
    }

    /// Inverse of [`ConfigModel::to_out_path`].
    pub fn to_root_path(&self, out_file: &Path) -> PathBuf {
        let out_file = if out_file.is_absolute() {
            normalize_path(out_file)
        } else {
            normalize_path(&self.out_path().join(out_file))
        };
        let rel = relative_path(&self.out_path(), &out_file);
        normalize_path(&self.root_path().join(rel))
    }

    /// Excluded directories as absolute glob strings.
    ///
    /// The out directory comes first when it differs from the root. A trailing
    /// `/**/*` is collapsed so the directory itself counts as excluded.
    pub fn excluded_dirs(&self) -> Vec<String> {
        let root = self.root_path();
        let out = self.out_path();
        let mut dirs = Vec::new();
        if out != root {
            dirs.push(to_virtual(&out));
        }
        for entry in self.excluded() {
            let entry = entry.strip_suffix(RECURSIVE_SUFFIX).unwrap_or(&entry);
            dirs.push(to_virtual(&normalize_path(&self.base_path().join(entry))));
        }
        dirs
    }

    /// True when `path` is an excluded directory or lies beneath one.
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        let candidate = to_virtual(&self.absolutize(path));
        self.excluded_dirs().iter().any(|dir| {
            match GlobSpec::new(dir, self.base_path()) {
                Ok(spec) => spec.matches_within(&candidate),
                Err(err) => {
                    trace!(pattern = %dir, error = %err, "skipping unusable exclude");
                    false
                }
            }
        })
    }

    /// Rewrite a relative module reference found in `module_path` so that it
    /// still resolves once the module has been copied into the out tree.
    ///
    /// References whose target lies inside the out tree are rewritten
    /// relative to the module's new location; all others are returned as is.
    pub fn move_module_spec(&self, module_path: &Path, spec: &str) -> String {
        let root = self.root_path();
        let out = self.out_path();
        if out == root {
            return spec.to_string();
        }

        let module = self.absolutize(module_path);
        let module_dir = module.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
        let target = normalize_path(&module_dir.join(spec));
        if !target.starts_with(&out) {
            return spec.to_string();
        }

        let moved = self.to_out_path(&module);
        let moved_dir = moved.parent().map(Path::to_path_buf).unwrap_or_else(|| out.clone());
        let rel = to_virtual(&relative_path(&moved_dir, &target));
        let rewritten = if rel.is_empty() {
            ".".to_string()
        } else if rel == ".." || rel.starts_with("../") {
            rel
        } else {
            format!("./{rel}")
        };
        trace!(module = %module.display(), from = spec, to = %rewritten, "moved module spec");
        rewritten
    }
}
