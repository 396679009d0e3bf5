//! Bounded worker pool draining the download queue.

use std::sync::Arc;

use geo::Geometry;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::progress::{DownloadSnapshot, ProgressSignals};
use super::session::{DownloadSession, Enqueued, Popped, QueuedTile};
use super::DownloadError;
use crate::config::DownloaderConfig;
use crate::coord::Tile;
use crate::generation::{new_tile_generation, GenerationStrategy, TileGenerationParams};
use crate::grid::{TileGrid, UrlTemplate};
use crate::provider::NetworkClient;
use crate::store::TileStore;

/// Downloads tiles for offline regions.
///
/// Each downloader owns one session. Enqueue operations return at once; the
/// work runs on tokio tasks spawned on the runtime captured at construction.
/// Cloning yields another handle to the same session.
pub struct TileDownloader<C, S> {
    shared: Arc<Shared<C, S>>,
}

impl<C, S> Clone for TileDownloader<C, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<C, S> {
    client: C,
    store: S,
    config: DownloaderConfig,
    runtime: Handle,
    session: Mutex<DownloadSession>,
    signals: ProgressSignals,
    strategy: Mutex<GenerationStrategy>,
}

impl<C: NetworkClient, S: TileStore> TileDownloader<C, S> {
    /// Creates a downloader on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NoRuntime`] outside a runtime context.
    pub fn new(client: C, store: S, config: DownloaderConfig) -> Result<Self, DownloadError> {
        let runtime = Handle::try_current().map_err(|_| DownloadError::NoRuntime)?;
        Ok(Self::with_runtime(client, store, config, runtime))
    }

    /// Creates a downloader spawning its workers on `runtime`.
    pub fn with_runtime(client: C, store: S, config: DownloaderConfig, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                store,
                config,
                runtime,
                session: Mutex::new(DownloadSession::default()),
                signals: ProgressSignals::new(),
                strategy: Mutex::new(GenerationStrategy::default()),
            }),
        }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.shared.config
    }

    pub fn client(&self) -> &C {
        &self.shared.client
    }

    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Strategy used by the last tile or geometry download.
    pub fn current_strategy(&self) -> GenerationStrategy {
        *self.shared.strategy.lock()
    }

    /// Downloads the tiles generated from one anchor tile.
    ///
    /// Tiles the template cannot address in `grid` are skipped. Returns the
    /// number of URLs queued; 0 when offline.
    pub fn download_from_tile(
        &self,
        anchor: Tile,
        region_id: &str,
        params: &TileGenerationParams,
        grid: &TileGrid,
        template: &UrlTemplate,
    ) -> usize {
        if !self.is_online() {
            return 0;
        }
        *self.shared.strategy.lock() = params.strategy;

        let tiles = new_tile_generation(params.strategy).generate(
            anchor,
            params.start_level,
            params.end_level,
        );
        debug!(
            anchor = %anchor,
            strategy = %params.strategy,
            tiles = tiles.len(),
            "Generated tiles from anchor"
        );
        self.enqueue_tiles(&tiles, region_id, grid, template)
    }

    /// Downloads the tiles covering drawn geometries.
    ///
    /// Returns the number of URLs queued; 0 when offline.
    pub fn download_from_geometries(
        &self,
        geometries: &[Geometry<f64>],
        region_id: &str,
        params: &TileGenerationParams,
        grid: &TileGrid,
        template: &UrlTemplate,
    ) -> usize {
        if !self.is_online() {
            return 0;
        }
        *self.shared.strategy.lock() = params.strategy;

        let tiles = new_tile_generation(params.strategy).generate_from_geometries(
            geometries,
            params.start_level,
            params.end_level,
            grid,
        );
        self.enqueue_tiles(&tiles, region_id, grid, template)
    }

    /// Downloads an explicit URL list. Empty strings are skipped.
    ///
    /// Returns the number of URLs queued; 0 when offline.
    pub fn download_from_urls<I, U>(&self, urls: I, region_id: &str) -> usize
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        if !self.is_online() {
            return 0;
        }
        let items = urls
            .into_iter()
            .map(Into::<String>::into)
            .filter(|url| !url.is_empty())
            .map(|url| QueuedTile {
                url,
                region_id: region_id.to_string(),
            })
            .collect();
        self.enqueue(items)
    }

    /// Receiver for the processed count.
    pub fn subscribe_progress(&self) -> watch::Receiver<u64> {
        self.shared.signals.subscribe_processed()
    }

    /// Receiver for the draining flag.
    pub fn subscribe_draining(&self) -> watch::Receiver<bool> {
        self.shared.signals.subscribe_draining()
    }

    pub fn is_draining(&self) -> bool {
        self.shared.session.lock().is_draining()
    }

    /// Counters of the current session, or of the last one once idle.
    pub fn snapshot(&self) -> DownloadSnapshot {
        self.shared.session.lock().snapshot()
    }

    /// `1 - queued / total`.
    pub fn buffer_progress(&self) -> f64 {
        self.snapshot().buffer_progress()
    }

    /// `processed / total`.
    pub fn progress_ratio(&self) -> f64 {
        self.snapshot().progress_ratio()
    }

    /// Resolves once no session is draining.
    pub async fn wait_until_idle(&self) {
        let mut draining = self.subscribe_draining();
        if draining.wait_for(|d| !*d).await.is_err() {
            trace!("Draining signal closed");
        }
    }

    fn is_online(&self) -> bool {
        if self.shared.client.is_online() {
            return true;
        }
        debug!("Offline, ignoring download request");
        false
    }

    fn enqueue_tiles(
        &self,
        tiles: &[Tile],
        region_id: &str,
        grid: &TileGrid,
        template: &UrlTemplate,
    ) -> usize {
        let items: Vec<QueuedTile> = tiles
            .iter()
            .filter_map(|tile| template.url_for(tile, grid).ok())
            .map(|url| QueuedTile {
                url,
                region_id: region_id.to_string(),
            })
            .collect();

        let skipped = tiles.len() - items.len();
        if skipped > 0 {
            debug!(skipped, template = template.as_str(), "Skipped tiles outside the grid");
        }
        self.enqueue(items)
    }

    fn enqueue(&self, items: Vec<QueuedTile>) -> usize {
        let count = items.len();
        let region_id = items.first().map(|i| i.region_id.clone()).unwrap_or_default();

        let mut session = self.shared.session.lock();
        match session.enqueue(items, self.shared.config.concurrency_limit) {
            Enqueued::Ignored => {
                trace!("Nothing to download");
            }
            Enqueued::Started { workers, total } => {
                self.shared.signals.publish_processed(0);
                self.shared.signals.publish_draining(true);
                info!(region_id = %region_id, total, workers, "Downloading started");
                for worker in 0..workers {
                    self.shared
                        .runtime
                        .spawn(run_worker(Arc::clone(&self.shared), worker));
                }
            }
            Enqueued::Merged { added, total } => {
                info!(region_id = %region_id, added, total, "Merged tiles into running download");
            }
        }
        count
    }
}

/// Pops until the queue is empty, then reports in.
async fn run_worker<C: NetworkClient, S: TileStore>(shared: Arc<Shared<C, S>>, worker: usize) {
    loop {
        let item = {
            let mut session = shared.session.lock();
            match session.pop_or_finish() {
                Popped::Item(item) => {
                    shared.signals.publish_processed(session.processed());
                    item
                }
                Popped::Finished { last: true } => {
                    shared.signals.publish_draining(false);
                    let snapshot = session.snapshot();
                    info!(
                        total = snapshot.total,
                        succeeded = snapshot.succeeded,
                        failed = snapshot.failed(),
                        "Downloading finished"
                    );
                    return;
                }
                Popped::Finished { last: false } => {
                    trace!(worker, "Worker found the queue empty");
                    return;
                }
            }
        };

        match shared.fetch_and_store(&item).await {
            Ok(bytes) => {
                shared.session.lock().record_success();
                trace!(worker, url = %item.url, bytes, "Tile stored");
            }
            Err(e) => {
                warn!(
                    worker,
                    url = %item.url,
                    region_id = %item.region_id,
                    error = %e,
                    "Tile download failed"
                );
            }
        }
    }
}

impl<C: NetworkClient, S: TileStore> Shared<C, S> {
    async fn fetch_and_store(&self, item: &QueuedTile) -> Result<usize, DownloadError> {
        let blob = self.fetch_with_retry(&item.url).await?;
        let bytes = blob.len();
        self.store.put(&item.url, &item.region_id, blob).await?;
        Ok(bytes)
    }

    /// One attempt plus up to `max_retries` retries.
    async fn fetch_with_retry(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.client.fetch(url).await {
                Ok(blob) => return Ok(blob),
                Err(e) if attempt <= self.config.max_retries => {
                    debug!(url = url, attempt, error = %e, "Fetch failed, retrying");
                    if !self.config.retry_delay.is_zero() {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(source) => {
                    return Err(DownloadError::Exhausted {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}
