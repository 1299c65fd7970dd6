// src/watch/subscription.rs

//! Filesystem change subscriptions.
//!
//! [`NotifySubscription`] wraps a `notify::RecommendedWatcher`. The notify
//! callback runs on notify's own thread and forwards translated events into a
//! tokio channel that the [`WatchEngine`](super::WatchEngine) consumes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::errors::{Result, TscUtilError};
use crate::fs::FileSystem;
use crate::glob::{GlobSpec, literal_prefix};
use crate::vpath::normalize_path;
use crate::watch::event::FsEvent;

/// Source of filesystem events for a set of globs.
pub trait FsSubscription: Send {
    /// Start delivering events for paths matching `pattern`.
    fn add(&mut self, pattern: &str) -> Result<()>;

    /// Stop delivering change/unlink events for one path. A later add for the
    /// path delivers events again; so does anything after its removal.
    fn unwatch(&mut self, path: &Path);

    /// Stop delivering events altogether.
    fn close(&mut self);
}

/// Filter state shared with the notify callback.
#[derive(Debug, Default)]
struct Filter {
    matchers: Vec<GlobSpec>,
    roots: Vec<PathBuf>,
    unwatched: HashSet<PathBuf>,
    closed: bool,
}

impl Filter {
    /// Decide whether `event` should be forwarded.
    fn admits(&mut self, event: &FsEvent) -> bool {
        if self.closed {
            return false;
        }
        match event {
            FsEvent::Error(_) => true,
            FsEvent::AddDir(path) | FsEvent::UnlinkDir(path) => {
                self.roots.iter().any(|root| path.starts_with(root))
            }
            FsEvent::Add(path) => {
                self.unwatched.remove(path);
                self.matches(path)
            }
            FsEvent::Change(path) => !self.unwatched.contains(path) && self.matches(path),
            FsEvent::Unlink(path) => !self.unwatched.remove(path) && self.matches(path),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}

fn lock(filter: &Mutex<Filter>) -> MutexGuard<'_, Filter> {
    filter.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Subscription backed by the platform watcher.
pub struct NotifySubscription {
    watcher: RecommendedWatcher,
    filter: Arc<Mutex<Filter>>,
    fs: Arc<dyn FileSystem>,
    tx: mpsc::UnboundedSender<FsEvent>,
    emit_initial: bool,
    /// Directories the initial scan does not descend into.
    skip_dirs: Vec<PathBuf>,
}

impl std::fmt::Debug for NotifySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySubscription")
            .field("emit_initial", &self.emit_initial)
            .finish_non_exhaustive()
    }
}

impl NotifySubscription {
    /// Create the watcher and the channel its events arrive on.
    ///
    /// With `emit_initial`, adding a pattern also emits `Add` for every
    /// existing file that matches it.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        emit_initial: bool,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FsEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let filter = Arc::new(Mutex::new(Filter::default()));

        let watcher = RecommendedWatcher::new(
            {
                let tx = tx.clone();
                let filter = Arc::clone(&filter);
                move |res: notify::Result<Event>| {
                    let events = match res {
                        Ok(event) => translate_event(event),
                        Err(err) => vec![FsEvent::Error(Arc::new(TscUtilError::WatchError(err)))],
                    };
                    for event in events {
                        if !lock(&filter).admits(&event) {
                            continue;
                        }
                        if tx.send(event).is_err() {
                            // Receiver gone: the engine has shut down.
                            return;
                        }
                    }
                }
            },
            Config::default().with_follow_symlinks(false),
        )?;

        Ok((
            Self {
                watcher,
                filter,
                fs,
                tx,
                emit_initial,
                skip_dirs: Vec::new(),
            },
            rx,
        ))
    }

    /// Keep the initial scan out of `dirs` (absolute paths).
    pub fn with_skip_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.skip_dirs = dirs.into_iter().map(|d| normalize_path(&d.into())).collect();
        self
    }

    /// Paths currently held back by [`FsSubscription::unwatch`].
    pub fn unwatched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = lock(&self.filter).unwatched.iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Directory to watch for `pattern`: its literal prefix, or the nearest
    /// existing ancestor of it.
    fn watch_root(&self, pattern: &str) -> Result<PathBuf> {
        let prefix = literal_prefix(pattern);
        let mut root = if Path::new(&prefix).is_absolute() {
            normalize_path(Path::new(&prefix))
        } else {
            normalize_path(&std::env::current_dir()?.join(&prefix))
        };
        while !self.fs.is_dir(&root) {
            match root.parent() {
                Some(parent) => root = parent.to_path_buf(),
                None => break,
            }
        }
        Ok(root)
    }

    fn emit_existing(&self, root: &Path, spec: &GlobSpec) {
        let mut stack = vec![root.to_path_buf()];
        let mut found = Vec::new();
        while let Some(dir) = stack.pop() {
            let mut entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                    continue;
                }
            };
            entries.sort();
            for entry in entries.into_iter().rev() {
                if self.fs.is_dir(&entry) {
                    if self.fs.is_symlink(&entry) || self.skip_dirs.iter().any(|d| entry == *d) {
                        trace!(dir = %entry.display(), "initial scan skips directory");
                        continue;
                    }
                    stack.push(entry);
                } else if spec.matches(&entry) {
                    found.push(entry);
                }
            }
        }
        found.sort();
        trace!(count = found.len(), pattern = %spec, "initial scan");
        for path in found {
            if self.tx.send(FsEvent::Add(path)).is_err() {
                return;
            }
        }
    }
}

impl FsSubscription for NotifySubscription {
    fn add(&mut self, pattern: &str) -> Result<()> {
        let spec = GlobSpec::new(pattern, ".")?;
        let root = self.watch_root(spec.pattern())?;

        let newly_watched = {
            let mut filter = lock(&self.filter);
            filter.matchers.push(spec.clone());
            if filter.roots.iter().any(|r| root.starts_with(r)) {
                false
            } else {
                filter.roots.push(root.clone());
                true
            }
        };

        if newly_watched {
            self.watcher.watch(&root, RecursiveMode::Recursive)?;
            info!(root = %root.display(), "file watcher started");
        }
        if self.emit_initial {
            self.emit_existing(&root, &spec);
        }
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) {
        // A path that is already gone can only come back through an add.
        if !self.fs.exists(path) {
            trace!(path = %path.display(), "unwatch of a removed path");
            return;
        }
        trace!(path = %path.display(), "unwatch");
        lock(&self.filter).unwatched.insert(path.to_path_buf());
    }

    fn close(&mut self) {
        let roots = {
            let mut filter = lock(&self.filter);
            filter.closed = true;
            std::mem::take(&mut filter.roots)
        };
        for root in roots {
            if let Err(err) = self.watcher.unwatch(&root) {
                warn!(root = %root.display(), error = %err, "failed to unwatch");
            }
        }
        debug!("subscription closed");
    }
}

/// Map one notify event onto the add/change/unlink vocabulary.
pub fn translate_event(event: Event) -> Vec<FsEvent> {
    let Event { kind, paths, .. } = event;
    match kind {
        EventKind::Create(CreateKind::Folder) => paths.into_iter().map(FsEvent::AddDir).collect(),
        EventKind::Create(CreateKind::File) => paths.into_iter().map(FsEvent::Add).collect(),
        EventKind::Create(_) => paths
            .into_iter()
            .map(|p| if p.is_dir() { FsEvent::AddDir(p) } else { FsEvent::Add(p) })
            .collect(),
        EventKind::Remove(RemoveKind::Folder) => {
            paths.into_iter().map(FsEvent::UnlinkDir).collect()
        }
        EventKind::Remove(_) => paths.into_iter().map(FsEvent::Unlink).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.into_iter().map(FsEvent::Unlink).collect(),
            RenameMode::To => paths.into_iter().map(FsEvent::Add).collect(),
            RenameMode::Both => {
                let mut paths = paths.into_iter();
                let mut out = Vec::new();
                if let Some(from) = paths.next() {
                    out.push(FsEvent::Unlink(from));
                }
                out.extend(paths.map(FsEvent::Add));
                out
            }
            _ => paths
                .into_iter()
                .map(|p| if p.exists() { FsEvent::Add(p) } else { FsEvent::Unlink(p) })
                .collect(),
        },
        EventKind::Modify(_) => paths
            .into_iter()
            .filter(|p| !p.is_dir())
            .map(FsEvent::Change)
            .collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}
