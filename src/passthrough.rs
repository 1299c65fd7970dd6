// src/passthrough.rs

//! Copies pass-through files (`.js`, `.d.ts`) into the out directory,
//! rewriting their module references on the way.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::config::ConfigModel;
use crate::errors::{Result, TscUtilError};
use crate::fs::{FileSystem, remove_if_exists};
use crate::resolver::FileSetResolver;
use crate::rewrite::{ModuleParser, rewrite_references};
use crate::watch::{FileHandler, HandlerFuture};

#[derive(Debug, Clone)]
pub struct PassThroughCopier {
    resolver: FileSetResolver,
    fs: Arc<dyn FileSystem>,
    parser: Arc<dyn ModuleParser>,
}

impl PassThroughCopier {
    pub fn new(
        resolver: FileSetResolver,
        fs: Arc<dyn FileSystem>,
        parser: Arc<dyn ModuleParser>,
    ) -> Self {
        Self { resolver, fs, parser }
    }

    fn config(&self) -> Arc<ConfigModel> {
        self.resolver.config_arc()
    }

    /// Copy one file. Failures are logged and swallowed.
    ///
    /// Returns the output path when a file was written.
    pub async fn copy_file(&self, path: PathBuf) -> Option<PathBuf> {
        trace!(path = %path.display(), "copy_file");
        let config = self.config();
        if config.is_ignored_path(&path) {
            debug!(path = %path.display(), "ignored path; not copied");
            return None;
        }

        let fs = Arc::clone(&self.fs);
        let parser = Arc::clone(&self.parser);
        let src = path.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            copy_blocking(fs.as_ref(), parser.as_ref(), &config, &src)
        })
        .await
        .map_err(|e| TscUtilError::Other(anyhow!("copy task failed: {e}")))
        .and_then(|res| res);

        match outcome {
            Ok(out) => {
                debug!(from = %path.display(), to = %out.display(), "copied");
                Some(out)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to copy pass-through file");
                None
            }
        }
    }

    /// Remove the output of `path`; an absent output counts as removed.
    pub async fn remove_output(&self, path: PathBuf) -> Result<()> {
        trace!(path = %path.display(), "remove_output");
        let out = self.config().to_out_path(&path);
        let fs = Arc::clone(&self.fs);
        let target = out.clone();
        tokio::task::spawn_blocking(move || remove_if_exists(fs.as_ref(), &target))
            .await
            .map_err(|e| TscUtilError::Other(anyhow!("remove task failed: {e}")))??;
        debug!(path = %out.display(), "removed output");
        Ok(())
    }

    /// Copy every pass-through file once, concurrently, and wait for all.
    ///
    /// Returns the number of files written.
    pub async fn run_batch(&self) -> Result<usize> {
        let files = self.resolver.resolve_auxiliary_file_paths().await?;
        info!(count = files.len(), "copying pass-through files");

        let mut tasks = JoinSet::new();
        for file in files {
            let this = self.clone();
            tasks.spawn(async move { this.copy_file(file).await });
        }

        let mut written = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(_)) => written += 1,
                Ok(None) => {}
                Err(err) => error!(error = %err, "copy task panicked"),
            }
        }
        info!(written, "pass-through copy finished");
        Ok(written)
    }
}

fn copy_blocking(
    fs: &dyn FileSystem,
    parser: &dyn ModuleParser,
    config: &ConfigModel,
    src: &Path,
) -> Result<PathBuf> {
    let out = config.to_out_path(src);
    match fs.read_to_string(src) {
        Ok(text) => {
            let rewritten =
                rewrite_references(parser, src, &text, |spec| config.move_module_spec(src, spec))?;
            fs.write(&out, rewritten.as_bytes())?;
        }
        // Not text: nothing to rewrite.
        Err(err) if err.kind() == ErrorKind::InvalidData => fs.copy(src, &out)?,
        Err(err) => return Err(err.into()),
    }
    Ok(out)
}

impl FileHandler for PassThroughCopier {
    fn on_add(&self, path: PathBuf) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move {
            this.copy_file(path).await;
            Ok(())
        })
    }

    fn on_change(&self, path: PathBuf) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move {
            this.copy_file(path).await;
            Ok(())
        })
    }

    fn on_unlink(&self, path: PathBuf) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move { this.remove_output(path).await })
    }
}
