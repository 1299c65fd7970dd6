#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tsc_util::compiler::{CompileFuture, Compiler, Diagnostic};
use tsc_util::config::CompilerOptions;
use tsc_util::errors::{Result, TscUtilError};
use tsc_util::watch::{FileHandler, FsEvent, FsSubscription, HandlerFuture};

/// Handler call as seen by a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Add(PathBuf),
    Change(PathBuf),
    Unlink(PathBuf),
}

impl Call {
    pub fn path(&self) -> &Path {
        match self {
            Call::Add(p) | Call::Change(p) | Call::Unlink(p) => p,
        }
    }
}

/// A fake file handler that:
/// - records every call in completion order
/// - optionally sleeps in `on_add` (to provoke reordering)
/// - optionally fails for chosen paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<Call>>>,
    add_delay: Option<Duration>,
    failing: Arc<Mutex<HashSet<PathBuf>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_add_delay(mut self, delay: Duration) -> Self {
        self.add_delay = Some(delay);
        self
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn finish(&self, call: Call) -> Result<()> {
        let failing = self.failing.lock().unwrap().contains(call.path());
        let path = call.path().to_path_buf();
        self.calls.lock().unwrap().push(call);
        if failing {
            Err(TscUtilError::Other(anyhow!("handler failed for {}", path.display())))
        } else {
            Ok(())
        }
    }
}

impl FileHandler for RecordingHandler {
    fn on_add(&self, path: PathBuf) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move {
            if let Some(delay) = this.add_delay {
                tokio::time::sleep(delay).await;
            }
            this.finish(Call::Add(path))
        })
    }

    fn on_change(&self, path: PathBuf) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move { this.finish(Call::Change(path)) })
    }

    fn on_unlink(&self, path: PathBuf) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move { this.finish(Call::Unlink(path)) })
    }
}

/// What a [`FakeSubscription`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionLog {
    pub added: Vec<String>,
    pub unwatched: Vec<PathBuf>,
    pub closed: bool,
}

/// A fake subscription that records calls and lets tests inject events.
#[derive(Debug, Clone)]
pub struct FakeSubscription {
    log: Arc<Mutex<SubscriptionLog>>,
    tx: mpsc::UnboundedSender<FsEvent>,
}

impl FakeSubscription {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                log: Arc::new(Mutex::new(SubscriptionLog::default())),
                tx,
            },
            rx,
        )
    }

    pub fn log(&self) -> SubscriptionLog {
        self.log.lock().unwrap().clone()
    }

    /// Deliver an event as if the filesystem had produced it.
    pub fn emit(&self, event: FsEvent) {
        let _ = self.tx.send(event);
    }
}

impl FsSubscription for FakeSubscription {
    fn add(&mut self, pattern: &str) -> Result<()> {
        self.log.lock().unwrap().added.push(pattern.to_string());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) {
        self.log.lock().unwrap().unwatched.push(path.to_path_buf());
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closed = true;
    }
}

/// A fake compiler that records its inputs and returns canned diagnostics.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
    diagnostics: Vec<Diagnostic>,
    compiled: Arc<Mutex<Vec<Vec<PathBuf>>>>,
    options: Arc<Mutex<Vec<CompilerOptions>>>,
}

impl FakeCompiler {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    /// File lists passed to `compile`/`watch`, one entry per call.
    pub fn compiled(&self) -> Vec<Vec<PathBuf>> {
        self.compiled.lock().unwrap().clone()
    }

    pub fn options(&self) -> Vec<CompilerOptions> {
        self.options.lock().unwrap().clone()
    }

    fn record(&self, files: &[PathBuf], options: &CompilerOptions) {
        self.compiled.lock().unwrap().push(files.to_vec());
        self.options.lock().unwrap().push(options.clone());
    }
}

impl Compiler for FakeCompiler {
    fn compile<'a>(
        &'a self,
        files: &'a [PathBuf],
        options: &'a CompilerOptions,
    ) -> CompileFuture<'a, Vec<Diagnostic>> {
        Box::pin(async move {
            self.record(files, options);
            Ok(self.diagnostics.clone())
        })
    }

    /// Sends the canned diagnostics, then runs until cancelled.
    fn watch<'a>(
        &'a self,
        files: &'a [PathBuf],
        options: &'a CompilerOptions,
        sink: mpsc::Sender<Diagnostic>,
    ) -> CompileFuture<'a, ()> {
        Box::pin(async move {
            self.record(files, options);
            for diag in &self.diagnostics {
                let _ = sink.send(diag.clone()).await;
            }
            std::future::pending::<()>().await;
            Ok(())
        })
    }
}
