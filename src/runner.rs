// src/runner.rs

//! Batch and watch execution modes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::compiler::{Compiler, Diagnostic, report_diagnostic};
use crate::config::ConfigModel;
use crate::errors::{Result, TscUtilError};
use crate::fs::FileSystem;
use crate::passthrough::PassThroughCopier;
use crate::resolver::FileSetResolver;
use crate::rewrite::ModuleParser;
use crate::watch::{
    FsEvent, FsSubscription, IdleMonitor, NotifySubscription, WatchEngine, WatchNotice,
    WatcherMap,
};

const DIAGNOSTIC_BUFFER: usize = 256;

/// Outcome of [`Runner::run_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Number of compiler input files.
    pub files: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Number of pass-through files written.
    pub copied: usize,
}

impl BatchReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Creates the filesystem subscription for watch mode.
pub type SubscriptionFactory = Arc<
    dyn Fn() -> Result<(Box<dyn FsSubscription>, mpsc::UnboundedReceiver<FsEvent>)> + Send + Sync,
>;

pub struct Runner {
    resolver: FileSetResolver,
    compiler: Arc<dyn Compiler>,
    fs: Arc<dyn FileSystem>,
    parser: Arc<dyn ModuleParser>,
    subscriptions: SubscriptionFactory,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("resolver", &self.resolver)
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Runner watching the real filesystem through `notify`.
    pub fn new(
        resolver: FileSetResolver,
        compiler: Arc<dyn Compiler>,
        fs: Arc<dyn FileSystem>,
        parser: Arc<dyn ModuleParser>,
    ) -> Self {
        let notify_fs = Arc::clone(&fs);
        let skip_dirs: Vec<PathBuf> = resolver
            .config()
            .excluded_dirs()
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let subscriptions: SubscriptionFactory = Arc::new(move || {
            let (sub, rx) = NotifySubscription::new(Arc::clone(&notify_fs), true)?;
            let sub = sub.with_skip_dirs(skip_dirs.iter().cloned());
            Ok((Box::new(sub) as Box<dyn FsSubscription>, rx))
        });
        Self {
            resolver,
            compiler,
            fs,
            parser,
            subscriptions,
        }
    }

    /// Replace how watch mode subscribes to filesystem changes.
    pub fn with_subscriptions(mut self, subscriptions: SubscriptionFactory) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    pub fn config(&self) -> &ConfigModel {
        self.resolver.config()
    }

    pub fn copier(&self) -> PassThroughCopier {
        PassThroughCopier::new(
            self.resolver.clone(),
            Arc::clone(&self.fs),
            Arc::clone(&self.parser),
        )
    }

    /// Pass-through files are only copied when the out tree is separate.
    pub fn copies_pass_through(&self) -> bool {
        self.config().root_path() != self.config().out_path()
    }

    /// Compile once, report, then copy the pass-through files.
    ///
    /// Diagnostics are reported, not treated as failure.
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let files = self.resolver.resolve_file_paths().await?;
        let options = self.config().resolved_compiler_options();
        info!(files = files.len(), "batch compile");

        let diagnostics = self.compiler.compile(&files, &options).await?;
        for diag in &diagnostics {
            report_diagnostic(diag);
        }

        let copied = if self.copies_pass_through() {
            self.copier().run_batch().await?
        } else {
            debug!("root and out directories coincide; nothing to copy");
            0
        };

        let report = BatchReport {
            files: files.len(),
            diagnostics,
            copied,
        };
        info!(
            files = report.files,
            errors = report.error_count(),
            copied = report.copied,
            "batch finished"
        );
        Ok(report)
    }

    /// Compile incrementally and keep copying until Ctrl-C, the idle timeout
    /// (when given) or the compiler exits.
    pub async fn run_watch(&self, idle_exit: Option<Duration>) -> Result<()> {
        let files = self.resolver.resolve_file_paths().await?;
        let options = self.config().resolved_compiler_options();

        let (diag_tx, mut diag_rx) = mpsc::channel::<Diagnostic>(DIAGNOSTIC_BUFFER);
        let reporter = tokio::spawn(async move {
            while let Some(diag) = diag_rx.recv().await {
                report_diagnostic(&diag);
            }
        });

        let compiler = Arc::clone(&self.compiler);
        let mut compile_task: JoinHandle<Result<()>> =
            tokio::spawn(async move { compiler.watch(&files, &options, diag_tx).await });

        let engine = if self.copies_pass_through() {
            Some(self.start_engine()?)
        } else {
            debug!("root and out directories coincide; pass-through watcher not started");
            None
        };
        let notice_log = engine.as_ref().map(|e| spawn_notice_log(e.subscribe()));

        let idle = {
            let notices = engine.as_ref().map(WatchEngine::subscribe);
            async move {
                match (idle_exit, notices) {
                    (Some(quiet), Some(notices)) => {
                        IdleMonitor::new(quiet).wait(notices).await;
                    }
                    (Some(quiet), None) => tokio::time::sleep(quiet).await,
                    (None, _) => std::future::pending::<()>().await,
                }
            }
        };

        let outcome = tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    warn!(error = %err, "failed to listen for Ctrl+C");
                }
                info!("interrupted; shutting down");
                Ok(())
            }
            _ = idle => {
                info!("no file activity; shutting down");
                Ok(())
            }
            joined = &mut compile_task => match joined {
                Ok(res) => res,
                Err(err) => Err(TscUtilError::Other(anyhow!("compiler task failed: {err}"))),
            },
        };

        compile_task.abort();
        if let Some(engine) = &engine {
            engine.close();
        }
        if let Some(task) = notice_log {
            task.abort();
        }
        reporter.abort();
        outcome
    }

    fn start_engine(&self) -> Result<WatchEngine> {
        let (subscription, events) = (self.subscriptions)()?;
        let engine = WatchEngine::new(subscription);
        engine.spawn(events);

        let patterns = self.resolver.watch_patterns()?;
        info!(patterns = ?patterns, "watching pass-through files");
        engine.watch(WatcherMap::with_patterns(patterns, Arc::new(self.copier())))?;
        Ok(engine)
    }
}

fn spawn_notice_log(mut notices: broadcast::Receiver<WatchNotice>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(WatchNotice::Error { path, error }) => {
                    warn!(path = ?path, error = %error, "watch error");
                }
                Ok(notice) => debug!(notice = notice.name(), path = ?notice.path(), "watch"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "watch notice log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
