//! Progress reporting for a download session.
//!
//! Two signals leave the scheduler: the processed count, ticking once per
//! popped URL, and the draining flag. Both are `tokio::sync::watch` channels
//! so late subscribers see the current value immediately.

use tokio::sync::watch;

/// Point-in-time view of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSnapshot {
    /// URLs enqueued in the current (or last) session.
    pub total: u64,
    /// URLs taken off the queue, successful or not.
    pub processed: u64,
    /// URLs fetched and stored.
    pub succeeded: u64,
    /// URLs still waiting.
    pub queued: u64,
    /// Workers spawned for the session.
    pub workers: usize,
}

impl DownloadSnapshot {
    /// Share of the total no longer waiting in the queue (0.0 to 1.0).
    ///
    /// 0.0 before any session.
    pub fn buffer_progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.queued as f64 / self.total as f64
    }

    /// Share of the total already processed (0.0 to 1.0).
    ///
    /// 0.0 before any session.
    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.processed as f64 / self.total as f64
    }

    /// Items processed without being stored.
    pub fn failed(&self) -> u64 {
        self.processed.saturating_sub(self.succeeded)
    }
}

/// Sending half of the session signals.
#[derive(Debug)]
pub(crate) struct ProgressSignals {
    processed: watch::Sender<u64>,
    draining: watch::Sender<bool>,
}

impl ProgressSignals {
    pub fn new() -> Self {
        let (processed, _) = watch::channel(0);
        let (draining, _) = watch::channel(false);
        Self {
            processed,
            draining,
        }
    }

    pub fn publish_processed(&self, processed: u64) {
        self.processed.send_replace(processed);
    }

    pub fn publish_draining(&self, draining: bool) {
        self.draining.send_replace(draining);
    }

    pub fn subscribe_processed(&self) -> watch::Receiver<u64> {
        self.processed.subscribe()
    }

    pub fn subscribe_draining(&self) -> watch::Receiver<bool> {
        self.draining.subscribe()
    }
}
