//! Tile download scheduling.
//!
//! A [`TileDownloader`] drains a FIFO queue of tile URLs with a bounded pool
//! of self-scheduling workers:
//!
//! ```text
//! download_from_*() ──► queue ──► worker 0 ─┐
//!                         │   ──► worker 1 ─┼──► NetworkClient::fetch ──► TileStore::put
//!                         │   ──► worker N ─┘
//!                         ▼
//!                  progress / draining (watch)
//! ```
//!
//! Each worker pops one URL, fetches it with retries, stores it and pops the
//! next. A worker that finds the queue empty reports in and exits; the
//! session is idle only when every spawned worker has reported, so an empty
//! queue alone never signals completion while a fetch is still in flight.
//!
//! Failures never abort the batch. The caller compares `total` with
//! `succeeded` once draining ends and re-enqueues what is missing.

mod progress;
mod scheduler;
mod session;

pub use progress::DownloadSnapshot;
pub use scheduler::TileDownloader;

use thiserror::Error;

use crate::provider::TransportError;
use crate::store::StoreError;

/// Errors from downloading a single tile, or from creating the scheduler.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The downloader was created outside a tokio runtime
    #[error("No tokio runtime available to run download workers")]
    NoRuntime,

    /// Every attempt to fetch the tile failed
    #[error("Fetch failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The tile was fetched but could not be stored
    #[error("Failed to store tile: {0}")]
    Store(#[from] StoreError),
}
