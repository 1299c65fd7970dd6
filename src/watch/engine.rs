// src/watch/engine.rs

//! Routes filesystem events to registered handlers.
//!
//! Each event is matched against the registered patterns in insertion order
//! and the first match wins. Handlers run on per-path lanes: work for one path
//! runs in arrival order, different paths run concurrently. A failing handler
//! only produces an `error` notice; the engine keeps watching.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::errors::{Result, TscUtilError};
use crate::glob::GlobSpec;
use crate::watch::event::{FsEvent, WatchNotice};
use crate::watch::subscription::FsSubscription;

const NOTICE_CAPACITY: usize = 1024;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Add/change/unlink handler triple for one routing entry.
pub trait FileHandler: Send + Sync + 'static {
    fn on_add(&self, path: PathBuf) -> HandlerFuture;
    fn on_change(&self, path: PathBuf) -> HandlerFuture;
    fn on_unlink(&self, path: PathBuf) -> HandlerFuture;
}

/// Patterns bound to one handler.
#[derive(Clone)]
pub struct WatcherMap {
    pub patterns: Vec<String>,
    pub handler: Arc<dyn FileHandler>,
}

impl WatcherMap {
    pub fn new(pattern: impl Into<String>, handler: Arc<dyn FileHandler>) -> Self {
        Self {
            patterns: vec![pattern.into()],
            handler,
        }
    }

    pub fn with_patterns<I, S>(patterns: I, handler: Arc<dyn FileHandler>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            handler,
        }
    }
}

impl fmt::Debug for WatcherMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherMap")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Watching,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Add,
    Change,
    Unlink,
}

struct Job {
    kind: JobKind,
    path: PathBuf,
    handler: Arc<dyn FileHandler>,
}

/// Per-path work: the lane's queue and whether an unlink ended the path.
struct PathState {
    lane: mpsc::UnboundedSender<Job>,
    released: bool,
}

struct Route {
    spec: GlobSpec,
    handler: Arc<dyn FileHandler>,
}

struct Inner {
    state: Mutex<EngineState>,
    routes: Mutex<Vec<Route>>,
    subscription: Mutex<Box<dyn FsSubscription>>,
    /// Paths with queued or running handler work. An entry is dropped as
    /// soon as its lane runs dry.
    paths: Mutex<HashMap<PathBuf, PathState>>,
    notices: broadcast::Sender<WatchNotice>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    fn publish(&self, notice: WatchNotice) {
        trace!(notice = notice.name(), path = ?notice.path(), "watch notice");
        // No receivers is fine.
        let _ = self.notices.send(notice);
    }

    fn publish_error(&self, path: Option<PathBuf>, error: TscUtilError) {
        self.publish(WatchNotice::Error {
            path,
            error: Arc::new(error),
        });
    }

    fn is_closed(&self) -> bool {
        *lock(&self.state) == EngineState::Closed
    }

    fn unwatch(&self, path: &Path) {
        lock(&self.subscription).unwatch(path);
    }
}

/// Event dispatcher over one filesystem subscription.
#[derive(Clone)]
pub struct WatchEngine {
    inner: Arc<Inner>,
}

impl fmt::Debug for WatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchEngine")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WatchEngine {
    pub fn new(subscription: Box<dyn FsSubscription>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState::Idle),
                routes: Mutex::new(Vec::new()),
                subscription: Mutex::new(subscription),
                paths: Mutex::new(HashMap::new()),
                notices,
            }),
        }
    }

    pub fn state(&self) -> EngineState {
        *lock(&self.inner.state)
    }

    /// Receive every notice published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchNotice> {
        self.inner.notices.subscribe()
    }

    /// Number of paths that still have handler work queued or running.
    pub fn tracked_paths(&self) -> usize {
        lock(&self.inner.paths).len()
    }

    /// Registered patterns in routing order.
    pub fn patterns(&self) -> Vec<String> {
        lock(&self.inner.routes)
            .iter()
            .map(|r| r.spec.pattern().to_string())
            .collect()
    }

    /// Register `map` and add its patterns to the subscription.
    ///
    /// A pattern that is already registered keeps its position and gets the
    /// new handler.
    pub fn watch(&self, map: WatcherMap) -> Result<()> {
        debug!(patterns = ?map.patterns, "watch");
        match map.patterns.as_slice() {
            [] => Err(TscUtilError::InvalidPattern(String::new())),
            [pattern] => self.watch_one(pattern, Arc::clone(&map.handler)),
            patterns => {
                for pattern in patterns {
                    self.watch(WatcherMap::new(pattern.clone(), Arc::clone(&map.handler)))?;
                }
                Ok(())
            }
        }
    }

    fn watch_one(&self, pattern: &str, handler: Arc<dyn FileHandler>) -> Result<()> {
        if self.state() == EngineState::Closed {
            return Err(TscUtilError::Other(anyhow!(
                "cannot watch {pattern:?}: watch engine is closed"
            )));
        }

        let spec = GlobSpec::new(pattern, ".")?;
        {
            let mut routes = lock(&self.inner.routes);
            match routes.iter_mut().find(|r| r.spec.pattern() == spec.pattern()) {
                Some(existing) => {
                    debug!(pattern = %spec, "replacing handler for pattern");
                    existing.handler = handler;
                }
                None => routes.push(Route { spec, handler }),
            }
        }

        // Adding a pattern may emit events for existing files right away;
        // they must find the engine watching.
        let previous = {
            let mut state = lock(&self.inner.state);
            let previous = *state;
            if previous == EngineState::Idle {
                *state = EngineState::Watching;
            }
            previous
        };

        if let Err(err) = lock(&self.inner.subscription).add(pattern) {
            warn!(pattern, error = %err, "failed to subscribe pattern");
            if previous == EngineState::Idle {
                let mut state = lock(&self.inner.state);
                if *state == EngineState::Watching {
                    *state = EngineState::Idle;
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Handle one raw filesystem event.
    pub fn dispatch(&self, event: FsEvent) {
        trace!(?event, "dispatch");
        if self.state() != EngineState::Watching {
            trace!("engine not watching; event ignored");
            return;
        }

        match event {
            FsEvent::Add(path) => {
                self.inner.publish(WatchNotice::Add(path.clone()));
                self.route(JobKind::Add, path);
            }
            FsEvent::Change(path) => {
                self.inner.publish(WatchNotice::Change(path.clone()));
                self.route(JobKind::Change, path);
            }
            FsEvent::Unlink(path) => {
                self.inner.publish(WatchNotice::Unlink(path.clone()));
                self.route(JobKind::Unlink, path);
            }
            FsEvent::AddDir(path) | FsEvent::UnlinkDir(path) => {
                debug!(path = %path.display(), "directory event ignored");
            }
            FsEvent::Error(error) => {
                error!(error = %error, "filesystem subscription error");
                self.inner.publish(WatchNotice::Error { path: None, error });
            }
        }
    }

    /// Consume events until the channel closes or the engine is closed.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<FsEvent>) {
        debug!("watch event loop started");
        while let Some(event) = events.recv().await {
            if self.state() == EngineState::Closed {
                break;
            }
            self.dispatch(event);
        }
        debug!("watch event loop finished");
    }

    /// Run [`WatchEngine::run`] on its own task.
    pub fn spawn(&self, events: mpsc::UnboundedReceiver<FsEvent>) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move { engine.run(events).await })
    }

    /// Release the subscription; no further events are handled and queued
    /// handler work is dropped.
    pub fn close(&self) {
        debug!("close");
        {
            let mut state = lock(&self.inner.state);
            if *state == EngineState::Closed {
                return;
            }
            *state = EngineState::Closed;
        }
        lock(&self.inner.subscription).close();
        lock(&self.inner.paths).clear();
    }

    /// First registered route matching `path`.
    fn map_file(&self, path: &Path) -> Option<Arc<dyn FileHandler>> {
        lock(&self.inner.routes)
            .iter()
            .find(|r| r.spec.matches(path))
            .map(|r| Arc::clone(&r.handler))
    }

    fn route(&self, kind: JobKind, path: PathBuf) {
        let released = kind != JobKind::Add
            && lock(&self.inner.paths)
                .get(&path)
                .is_some_and(|state| state.released);
        let handler = if released { None } else { self.map_file(&path) };

        let Some(handler) = handler else {
            let err = TscUtilError::UnroutedPath(path.clone());
            error!(path = %path.display(), "{err}");
            self.inner.unwatch(&path);
            self.inner.publish_error(Some(path), err);
            return;
        };

        self.enqueue(Job {
            kind,
            path,
            handler,
        });
    }

    fn enqueue(&self, job: Job) {
        let mut paths = lock(&self.inner.paths);
        let released = job.kind == JobKind::Unlink;
        let job = match paths.get_mut(&job.path) {
            Some(state) => match state.lane.send(job) {
                Ok(()) => {
                    state.released = released;
                    return;
                }
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };

        let path = job.path.clone();
        let (lane, rx) = mpsc::unbounded_channel();
        // A fresh receiver is alive, so this send cannot fail.
        let _ = lane.send(job);
        paths.insert(path.clone(), PathState { lane, released });
        tokio::spawn(run_lane(Arc::clone(&self.inner), path, rx));
    }
}

/// Worker for one path: runs its jobs in order.
async fn run_lane(inner: Arc<Inner>, path: PathBuf, mut rx: mpsc::UnboundedReceiver<Job>) {
    trace!(path = %path.display(), "lane started");
    while let Some(job) = rx.recv().await {
        if inner.is_closed() {
            break;
        }
        run_job(&inner, job).await;

        let mut paths = lock(&inner.paths);
        if rx.is_empty() {
            paths.remove(&path);
            break;
        }
    }
    trace!(path = %path.display(), "lane finished");
}

async fn run_job(inner: &Inner, job: Job) {
    let Job {
        kind,
        path,
        handler,
    } = job;

    let result = match kind {
        JobKind::Add => handler.on_add(path.clone()).await,
        JobKind::Change => handler.on_change(path.clone()).await,
        JobKind::Unlink => handler.on_unlink(path.clone()).await,
    };

    if inner.is_closed() {
        trace!(path = %path.display(), "engine closed; handler result dropped");
        return;
    }
    if kind == JobKind::Unlink {
        inner.unwatch(&path);
    }

    match result {
        Ok(()) => inner.publish(match kind {
            JobKind::Add => WatchNotice::Added(path),
            JobKind::Change => WatchNotice::Changed(path),
            JobKind::Unlink => WatchNotice::Unlinked(path),
        }),
        Err(err) => {
            error!(path = %path.display(), error = %err, "watch handler failed");
            inner.publish_error(Some(path), err);
        }
    }
}
