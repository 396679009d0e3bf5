//! Tile generation strategies.
//!
//! This module turns a download request into the concrete list of tiles to
//! fetch. A request is either a single anchor tile picked on the map or a set
//! of drawn geometries, together with a zoom window `[start_level,
//! end_level]`.
//!
//! # Architecture
//!
//! The strategies are interchangeable implementations of one trait, selected
//! through an explicit enum tag:
//!
//! ```text
//! GenerationStrategy (tag) ──new_tile_generation()──► Box<dyn TileGeneration>
//!                                                         ├── ParentTileGeneration
//!                                                         ├── MiddleTileGeneration
//!                                                         └── ChildTileGeneration
//! ```
//!
//! They differ only in where the anchor sits inside the zoom window. Every
//! strategy returns exactly `subtree_node_count(end_level - start_level)`
//! tiles for an anchor; geometry-driven generation is shared.
//!
//! # Example
//!
//! ```
//! use tilefetch::coord::Tile;
//! use tilefetch::generation::{new_tile_generation, GenerationStrategy};
//!
//! let strategy = new_tile_generation("child".parse::<GenerationStrategy>().unwrap());
//! let tiles = strategy.generate(Tile::new(77, 90, 8).unwrap(), 6, 8);
//! assert_eq!(tiles.len(), 21);
//! ```

mod geometry;
mod strategies;

pub use geometry::{expand_pruned, start_level_anchors};
pub use strategies::{ChildTileGeneration, MiddleTileGeneration, ParentTileGeneration};

use std::fmt;
use std::str::FromStr;

use geo::Geometry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{subtree_nodes, Tile, MAX_ZOOM};
use crate::grid::TileGrid;

/// Errors raised while selecting or configuring a generation strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The strategy name is not one of `parent`, `middle`, `child`
    #[error("Invalid tile generation strategy: '{0}'")]
    InvalidStrategy(String),

    /// The zoom window is inverted
    #[error("Invalid zoom window: start level {start} is above end level {end}")]
    InvalidLevels { start: u8, end: u8 },

    /// The zoom window reaches below the deepest supported level
    #[error("Invalid zoom window: end level {0} is above {MAX_ZOOM}")]
    EndLevelTooDeep(u8),
}

/// Tag identifying a generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStrategy {
    /// Anchor sits at the top of the window
    #[default]
    Parent,
    /// Anchor sits halfway down the window
    Middle,
    /// Anchor sits at the bottom of the window
    Child,
}

impl GenerationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStrategy::Parent => "parent",
            GenerationStrategy::Middle => "middle",
            GenerationStrategy::Child => "child",
        }
    }

    /// How many levels above the anchor the window starts, for a window of
    /// `depth` levels.
    pub fn levels_above_anchor(&self, depth: u8) -> u8 {
        match self {
            GenerationStrategy::Parent => 0,
            GenerationStrategy::Middle => depth / 2,
            GenerationStrategy::Child => depth,
        }
    }
}

impl fmt::Display for GenerationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStrategy {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parent" => Ok(GenerationStrategy::Parent),
            "middle" => Ok(GenerationStrategy::Middle),
            "child" => Ok(GenerationStrategy::Child),
            _ => Err(GenerationError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Parameters a region was (or will be) generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGenerationParams {
    /// Top of the zoom window
    pub start_level: u8,
    /// Bottom of the zoom window
    pub end_level: u8,
    /// Zoom level the anchor tiles were picked at
    pub parent_level: u8,
    /// Where the anchor sits inside the window
    pub strategy: GenerationStrategy,
}

impl TileGenerationParams {
    /// Creates parameters, rejecting an inverted zoom window or one that
    /// ends past [`MAX_ZOOM`].
    pub fn new(
        start_level: u8,
        end_level: u8,
        strategy: GenerationStrategy,
    ) -> Result<Self, GenerationError> {
        if start_level > end_level {
            return Err(GenerationError::InvalidLevels {
                start: start_level,
                end: end_level,
            });
        }
        if end_level > MAX_ZOOM {
            return Err(GenerationError::EndLevelTooDeep(end_level));
        }
        Ok(Self {
            start_level,
            end_level,
            parent_level: start_level,
            strategy,
        })
    }

    /// Records the zoom the anchors were picked at.
    pub fn with_parent_level(mut self, parent_level: u8) -> Self {
        self.parent_level = parent_level;
        self
    }

    /// Number of levels below the top of the window.
    pub fn depth(&self) -> u8 {
        self.end_level.saturating_sub(self.start_level)
    }
}

/// Common contract of the generation strategies.
pub trait TileGeneration: Send + Sync {
    /// Tag of this strategy.
    fn kind(&self) -> GenerationStrategy;

    /// Tiles to fetch for an anchor tile and a zoom window.
    ///
    /// Returns `subtree_node_count(end_level - start_level)` tiles, root of
    /// the window first. An inverted window is treated as depth 0. Windows
    /// running past [`MAX_ZOOM`] are cut there and return fewer tiles.
    fn generate(&self, anchor: Tile, start_level: u8, end_level: u8) -> Vec<Tile>;

    /// Tiles to fetch for drawn geometries and a zoom window.
    ///
    /// Start-level tiles intersecting each geometry are expanded down to
    /// `end_level`, descending only into tiles that still intersect. The
    /// union is deduplicated, first appearance kept.
    fn generate_from_geometries(
        &self,
        geometries: &[Geometry<f64>],
        start_level: u8,
        end_level: u8,
        grid: &TileGrid,
    ) -> Vec<Tile> {
        geometry::generate_from_geometries(geometries, start_level, end_level, grid)
    }
}

/// Builds the strategy for a tag.
pub fn new_tile_generation(kind: GenerationStrategy) -> Box<dyn TileGeneration> {
    match kind {
        GenerationStrategy::Parent => Box::new(ParentTileGeneration),
        GenerationStrategy::Middle => Box::new(MiddleTileGeneration),
        GenerationStrategy::Child => Box::new(ChildTileGeneration),
    }
}

/// Builds the strategy for a name, failing fast on unknown names.
pub fn tile_generation_by_name(name: &str) -> Result<Box<dyn TileGeneration>, GenerationError> {
    Ok(new_tile_generation(name.parse()?))
}

/// Walks `levels_up` levels above the anchor (stopping at zoom 0) and expands
/// the window of `depth` levels below that ancestor.
fn expand_window(anchor: Tile, levels_up: u8, depth: u8) -> Vec<Tile> {
    let up = levels_up.min(anchor.zoom);
    let top = anchor.ancestor(anchor.zoom - up);
    subtree_nodes(top, top.zoom.saturating_add(depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::subtree_node_count;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("parent".parse(), Ok(GenerationStrategy::Parent));
        assert_eq!("Middle".parse(), Ok(GenerationStrategy::Middle));
        assert_eq!(" CHILD ".parse(), Ok(GenerationStrategy::Child));
    }

    #[test]
    fn test_invalid_strategy_fails_fast() {
        let result = tile_generation_by_name("sibling");
        assert!(matches!(
            result,
            Err(GenerationError::InvalidStrategy(ref name)) if name == "sibling"
        ));
    }

    #[test]
    fn test_factory_reports_its_tag() {
        for kind in [
            GenerationStrategy::Parent,
            GenerationStrategy::Middle,
            GenerationStrategy::Child,
        ] {
            assert_eq!(new_tile_generation(kind).kind(), kind);
            assert_eq!(kind.as_str().parse::<GenerationStrategy>(), Ok(kind));
        }
    }

    #[test]
    fn test_params_reject_inverted_window() {
        assert_eq!(
            TileGenerationParams::new(10, 8, GenerationStrategy::Parent),
            Err(GenerationError::InvalidLevels { start: 10, end: 8 })
        );
        let params = TileGenerationParams::new(8, 12, GenerationStrategy::Middle)
            .unwrap()
            .with_parent_level(10);
        assert_eq!(params.depth(), 4);
        assert_eq!(params.parent_level, 10);
    }

    #[test]
    fn test_params_reject_end_level_past_max_zoom() {
        assert_eq!(
            TileGenerationParams::new(27, 31, GenerationStrategy::Parent),
            Err(GenerationError::EndLevelTooDeep(31))
        );
        assert!(TileGenerationParams::new(27, MAX_ZOOM, GenerationStrategy::Parent).is_ok());
    }

    #[test]
    fn test_params_serde_uses_lowercase_strategy() {
        let params = TileGenerationParams::new(5, 7, GenerationStrategy::Child).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"strategy\":\"child\""));
        let back: TileGenerationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_expand_window_clamps_at_world_root() {
        // Walking up 5 levels from zoom 2 stops at the root
        let tiles = expand_window(Tile::new_unchecked(1, 2, 2), 5, 3);
        assert_eq!(tiles[0], Tile::root());
        assert_eq!(tiles.len() as u64, subtree_node_count(3));
    }
}
