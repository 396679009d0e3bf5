//! In-memory tile store using moka.
//!
//! Entries are weighted by blob size so the capacity is a byte budget.

use moka::future::Cache as MokaCache;

use super::{BoxFuture, StoreError, StoredTile, TileStore};

/// Default byte budget: 256 MiB.
pub const DEFAULT_MEMORY_CAPACITY: u64 = 256 * 1024 * 1024;

/// In-memory tile store.
#[derive(Clone)]
pub struct MemoryTileStore {
    cache: MokaCache<String, StoredTile>,
    max_size_bytes: u64,
}

impl MemoryTileStore {
    /// Creates a store holding at most `max_size_bytes` of tile data.
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = MokaCache::builder()
            // moka weights are u32, cap very large blobs
            .weigher(|_url: &String, tile: &StoredTile| -> u32 {
                tile.blob.len().min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .build();

        Self {
            cache,
            max_size_bytes,
        }
    }

    /// Total bytes currently held.
    pub fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Runs moka's pending maintenance so counters are exact.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MemoryTileStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl TileStore for MemoryTileStore {
    fn put(&self, url: &str, region_id: &str, blob: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
        let url = url.to_string();
        let region_id = region_id.to_string();
        Box::pin(async move {
            if blob.len() as u64 > self.max_size_bytes {
                return Err(StoreError::TooLarge {
                    size: blob.len(),
                    max: self.max_size_bytes as usize,
                });
            }
            self.cache.insert(url, StoredTile { region_id, blob }).await;
            Ok(())
        })
    }

    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<StoredTile>, StoreError>> {
        let url = url.to_string();
        Box::pin(async move { Ok(self.cache.get(&url).await) })
    }

    fn contains(&self, url: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let url = url.to_string();
        Box::pin(async move { Ok(self.cache.contains_key(&url)) })
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryTileStore::default();
        store
            .put("https://tile.example/1/0/0", "region-a", vec![1, 2, 3])
            .await
            .unwrap();

        let tile = store.get("https://tile.example/1/0/0").await.unwrap().unwrap();
        assert_eq!(tile.region_id, "region-a");
        assert_eq!(tile.blob, vec![1, 2, 3]);
        assert!(store.contains("https://tile.example/1/0/0").await.unwrap());
        assert!(!store.contains("https://tile.example/1/1/0").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces_previous_blob() {
        let store = MemoryTileStore::default();
        store.put("u", "old", vec![1]).await.unwrap();
        store.put("u", "new", vec![2, 2]).await.unwrap();
        store.sync().await;

        assert_eq!(store.entry_count(), 1);
        let tile = store.get("u").await.unwrap().unwrap();
        assert_eq!(tile.region_id, "new");
        assert_eq!(store.size_bytes(), 2);
    }

    #[tokio::test]
    async fn test_oversized_blob_is_rejected() {
        let store = MemoryTileStore::new(4);
        let result = store.put("u", "r", vec![0; 8]).await;
        assert!(matches!(result, Err(StoreError::TooLarge { size: 8, max: 4 })));
        assert!(store.get("u").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let store: std::sync::Arc<dyn TileStore> = std::sync::Arc::new(MemoryTileStore::default());
        store.put("u", "r", vec![9]).await.unwrap();
        assert!(store.contains("u").await.unwrap());
    }
}
