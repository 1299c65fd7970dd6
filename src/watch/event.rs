// src/watch/event.rs

//! Raw filesystem events coming in and public notices going out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::TscUtilError;

/// Event delivered by a filesystem subscription, keyed by path.
#[derive(Debug, Clone)]
pub enum FsEvent {
    Add(PathBuf),
    Change(PathBuf),
    Unlink(PathBuf),
    AddDir(PathBuf),
    UnlinkDir(PathBuf),
    /// Subscription-level failure.
    Error(Arc<TscUtilError>),
}

impl FsEvent {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FsEvent::Add(p)
            | FsEvent::Change(p)
            | FsEvent::Unlink(p)
            | FsEvent::AddDir(p)
            | FsEvent::UnlinkDir(p) => Some(p),
            FsEvent::Error(_) => None,
        }
    }
}

/// Lifecycle notice published by the watch engine.
///
/// `Add`/`Change`/`Unlink` are sent when the event arrives; the past-tense
/// variants once the handler has finished successfully.
#[derive(Debug, Clone)]
pub enum WatchNotice {
    Add(PathBuf),
    Added(PathBuf),
    Change(PathBuf),
    Changed(PathBuf),
    Unlink(PathBuf),
    Unlinked(PathBuf),
    Error {
        path: Option<PathBuf>,
        error: Arc<TscUtilError>,
    },
}

impl WatchNotice {
    pub fn name(&self) -> &'static str {
        match self {
            WatchNotice::Add(_) => "add",
            WatchNotice::Added(_) => "added",
            WatchNotice::Change(_) => "change",
            WatchNotice::Changed(_) => "changed",
            WatchNotice::Unlink(_) => "unlink",
            WatchNotice::Unlinked(_) => "unlinked",
            WatchNotice::Error { .. } => "error",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchNotice::Add(p)
            | WatchNotice::Added(p)
            | WatchNotice::Change(p)
            | WatchNotice::Changed(p)
            | WatchNotice::Unlink(p)
            | WatchNotice::Unlinked(p) => Some(p),
            WatchNotice::Error { path, .. } => path.as_deref(),
        }
    }

    /// True for the notices that count as file activity (add/change/unlink).
    pub fn is_activity(&self) -> bool {
        matches!(
            self,
            WatchNotice::Add(_) | WatchNotice::Change(_) | WatchNotice::Unlink(_)
        )
    }
}
