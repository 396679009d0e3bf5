//! Storage for downloaded tile blobs.
//!
//! The scheduler hands every fetched tile to a [`TileStore`] keyed by its
//! URL and tagged with the region that requested it. Hosts plug in their own
//! persistent store; [`MemoryTileStore`] keeps everything in process.

mod memory;

pub use memory::MemoryTileStore;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Errors that can occur while storing or reading tiles.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error in a persistent backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob is larger than the store accepts.
    #[error("Tile too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// Backend-specific error.
    #[error("Store error: {0}")]
    Backend(String),
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A stored tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTile {
    /// Region that requested the tile last.
    pub region_id: String,
    /// Raw tile bytes as served.
    pub blob: Vec<u8>,
}

/// Key-value interface for tile blobs, keyed by tile URL.
///
/// Uses boxed futures so the scheduler can hold `Arc<dyn TileStore>` as
/// easily as a concrete type.
pub trait TileStore: Send + Sync + 'static {
    /// Stores a tile, replacing any previous blob for the URL.
    fn put(&self, url: &str, region_id: &str, blob: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Reads a stored tile.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<StoredTile>, StoreError>>;

    /// Whether a tile is stored for the URL.
    fn contains(&self, url: &str) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Number of stored tiles.
    fn entry_count(&self) -> u64;
}

impl<T: TileStore + ?Sized> TileStore for std::sync::Arc<T> {
    fn put(&self, url: &str, region_id: &str, blob: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
        (**self).put(url, region_id, blob)
    }

    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<StoredTile>, StoreError>> {
        (**self).get(url)
    }

    fn contains(&self, url: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        (**self).contains(url)
    }

    fn entry_count(&self) -> u64 {
        (**self).entry_count()
    }
}
