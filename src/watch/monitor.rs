// src/watch/monitor.rs

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

use crate::watch::event::WatchNotice;

/// Why [`IdleMonitor::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleExit {
    /// No file activity for the whole quiet period.
    Idle,
    /// The notice channel closed.
    Closed,
}

/// Resolves once no add/change/unlink notice has been seen for `quiet`.
///
/// Every activity notice restarts the timer; other notices do not.
#[derive(Debug, Clone, Copy)]
pub struct IdleMonitor {
    quiet: Duration,
}

impl IdleMonitor {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub async fn wait(&self, mut notices: broadcast::Receiver<WatchNotice>) -> IdleExit {
        let mut deadline = Instant::now() + self.quiet;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    debug!(quiet = ?self.quiet, "watch session idle");
                    return IdleExit::Idle;
                }
                received = notices.recv() => match received {
                    Ok(notice) if notice.is_activity() => {
                        trace!(notice = notice.name(), "activity; idle timer reset");
                        deadline = Instant::now() + self.quiet;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        trace!(skipped, "notice receiver lagged; idle timer reset");
                        deadline = Instant::now() + self.quiet;
                    }
                    Err(RecvError::Closed) => return IdleExit::Closed,
                },
            }
        }
    }
}
