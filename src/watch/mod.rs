// src/watch/mod.rs

//! Long-lived file watching.
//!
//! This module is responsible for:
//! - Subscribing to filesystem changes (`notify`) for a set of globs.
//! - Routing each change to the handler registered for a matching glob.
//! - Publishing lifecycle notices and an optional idle timeout.

pub mod engine;
pub mod event;
pub mod monitor;
pub mod subscription;

pub use engine::{EngineState, FileHandler, HandlerFuture, WatchEngine, WatcherMap};
pub use event::{FsEvent, WatchNotice};
pub use monitor::{IdleExit, IdleMonitor};
pub use subscription::{FsSubscription, NotifySubscription, translate_event};
