//! Download size estimation.
//!
//! Estimates are a planning heuristic: tile counts come from the quadtree
//! closed form and each tile is priced at a fixed average size. Nothing here
//! looks at real downloaded bytes.
//!
//! # Update regimes
//!
//! When an existing region is edited, two numbers matter:
//!
//! - `download_size`: cost of fetching the whole edited region again
//! - `new_allocated_size`: extra storage the edit needs on top of what the
//!   region already holds
//!
//! Their relation tells the edit apart:
//!
//! | Regime      | Condition                                  |
//! |-------------|--------------------------------------------|
//! | `Unchanged` | `new_allocated_size == 0`                  |
//! | `Growing`   | `0 < new_allocated_size < download_size`   |
//! | `NewRegion` | `new_allocated_size == download_size`      |

use std::collections::HashSet;

use geo::Geometry;
use tracing::{debug, warn};

use crate::config::{DownloaderConfig, DEFAULT_AVERAGE_BYTES_PER_TILE};
use crate::coord::{subtree_node_count, Tile};
use crate::generation::{start_level_anchors, TileGenerationParams};
use crate::grid::TileGrid;
use crate::region::{RegionRecord, TileToDownload};

/// Bytes per megabyte used for display (decimal).
const BYTES_PER_MEGABYTE: f64 = 1e6;

/// How an estimate compares with what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationRegime {
    /// Nothing new to store
    Unchanged,
    /// Some of the region is already stored
    Growing,
    /// Nothing of the region is stored yet
    NewRegion,
}

/// Estimated sizes in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSizeEstimation {
    /// Bytes fetched to download the whole region.
    pub download_size: u64,
    /// Bytes of storage not already held by the region.
    pub new_allocated_size: u64,
}

impl DownloadSizeEstimation {
    /// Estimate for a region with nothing stored yet.
    pub fn fresh(download_size: u64) -> Self {
        Self {
            download_size,
            new_allocated_size: download_size,
        }
    }

    pub fn regime(&self) -> EstimationRegime {
        if self.new_allocated_size == 0 {
            EstimationRegime::Unchanged
        } else if self.new_allocated_size >= self.download_size {
            EstimationRegime::NewRegion
        } else {
            EstimationRegime::Growing
        }
    }

    /// Both sizes in megabytes, `(download, new_allocated)`.
    pub fn in_megabytes(&self) -> (f64, f64) {
        (
            self.download_size as f64 / BYTES_PER_MEGABYTE,
            self.new_allocated_size as f64 / BYTES_PER_MEGABYTE,
        )
    }
}

/// Prices tile sets at a fixed average tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadEstimator {
    average_bytes_per_tile: u64,
}

impl Default for DownloadEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_BYTES_PER_TILE)
    }
}

impl From<&DownloaderConfig> for DownloadEstimator {
    fn from(config: &DownloaderConfig) -> Self {
        Self::new(config.average_bytes_per_tile)
    }
}

impl DownloadEstimator {
    pub fn new(average_bytes_per_tile: u64) -> Self {
        Self {
            average_bytes_per_tile,
        }
    }

    pub fn average_bytes_per_tile(&self) -> u64 {
        self.average_bytes_per_tile
    }

    /// Bytes for `n_tiles` tiles.
    pub fn download_estimate(&self, n_tiles: u64) -> u64 {
        n_tiles.saturating_mul(self.average_bytes_per_tile)
    }

    /// Bytes for one anchor expanded `depth` levels.
    pub fn download_estimate_per_depth(&self, depth: u8) -> u64 {
        self.download_estimate(self.number_of_tiles(depth))
    }

    /// Tiles in one anchor expanded `depth` levels.
    pub fn number_of_tiles(&self, depth: u8) -> u64 {
        subtree_node_count(depth)
    }

    /// Estimate for a region that does not exist yet.
    ///
    /// Every anchor and every start-level tile touched by a geometry
    /// contributes a full window of `params.depth()` levels.
    pub fn estimate_region_download_size(
        &self,
        anchors: &[TileToDownload],
        geometries: &[Geometry<f64>],
        params: &TileGenerationParams,
        grid: &TileGrid,
    ) -> DownloadSizeEstimation {
        let per_anchor = self.number_of_tiles(params.depth());
        let geometry_anchors = start_level_anchors(geometries, params.start_level, grid).len() as u64;
        let n_tiles = per_anchor.saturating_mul(anchors.len() as u64 + geometry_anchors);

        debug!(
            anchors = anchors.len(),
            geometry_anchors,
            depth = params.depth(),
            n_tiles,
            "Estimated fresh region"
        );
        DownloadSizeEstimation::fresh(self.download_estimate(n_tiles))
    }

    /// Estimate for editing a stored region.
    ///
    /// The edited region is the union of the stored anchors and the new
    /// ones, expanded with `params`. Stored geometries are re-anchored at
    /// `params.start_level`. Storage grows by the anchors the region does not
    /// hold yet, plus the extra levels stored anchors gain when the window
    /// got deeper. Moving the start level invalidates every stored window, so
    /// the whole edited region counts as new storage.
    pub fn estimate_region_update_size(
        &self,
        region: &RegionRecord,
        anchors: &[TileToDownload],
        geometries: &[Geometry<f64>],
        params: &TileGenerationParams,
        grid: &TileGrid,
    ) -> DownloadSizeEstimation {
        let stored = stored_anchor_set(region, params.start_level, grid);
        let proposed: HashSet<Tile> = anchors
            .iter()
            .map(|a| a.tile)
            .chain(start_level_anchors(geometries, params.start_level, grid))
            .collect();

        let added = proposed.difference(&stored).count() as u64;
        let all = stored.len() as u64 + added;

        let per_anchor = self.number_of_tiles(params.depth());
        let download_tiles = per_anchor.saturating_mul(all);

        let same_start = params.start_level == region.generation_params.start_level;
        let new_tiles = if same_start {
            let previous_per_anchor = self.number_of_tiles(region.generation_params.depth());
            let growth = per_anchor.saturating_sub(previous_per_anchor);
            per_anchor
                .saturating_mul(added)
                .saturating_add(growth.saturating_mul(stored.len() as u64))
        } else {
            download_tiles
        };

        let estimation = DownloadSizeEstimation {
            download_size: self.download_estimate(download_tiles),
            new_allocated_size: self.download_estimate(new_tiles),
        };
        debug!(
            region_id = %region.id,
            stored = stored.len(),
            added,
            same_start,
            regime = ?estimation.regime(),
            "Estimated region update"
        );
        estimation
    }
}

/// Anchors a stored region covers, with its geometries anchored at
/// `start_level`.
fn stored_anchor_set(region: &RegionRecord, start_level: u8, grid: &TileGrid) -> HashSet<Tile> {
    let mut stored: HashSet<Tile> = region.anchor_tiles().collect();
    match region.parsed_geometries() {
        Ok(geometries) => {
            stored.extend(start_level_anchors(&geometries, start_level, grid));
        }
        Err(e) => {
            warn!(region_id = %region.id, error = %e, "Ignoring unreadable region geometries");
        }
    }
    stored
}
