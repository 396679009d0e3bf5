//! The three anchor placements.
//!
//! With `d = end_level - start_level`:
//!
//! | Strategy | Anchor sits at        | Window top              |
//! |----------|-----------------------|-------------------------|
//! | Parent   | `start_level`         | the anchor              |
//! | Middle   | `start_level + d / 2` | anchor, `d / 2` levels up |
//! | Child    | `end_level`           | anchor, `d` levels up   |
//!
//! The window top is then expanded `d` levels down, so all three produce
//! `subtree_node_count(d)` tiles.

use super::{expand_window, GenerationStrategy, TileGeneration};
use crate::coord::Tile;

/// Anchor treated as the top of the window: full downward expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentTileGeneration;

impl TileGeneration for ParentTileGeneration {
    fn kind(&self) -> GenerationStrategy {
        GenerationStrategy::Parent
    }

    fn generate(&self, anchor: Tile, start_level: u8, end_level: u8) -> Vec<Tile> {
        let depth = end_level.saturating_sub(start_level);
        expand_window(anchor, self.kind().levels_above_anchor(depth), depth)
    }
}

/// Anchor treated as an intermediate level of the window.
///
/// The result holds the anchor's ancestor chain up to the window top and the
/// subtree below the anchor's level, as one pre-order walk from the top.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiddleTileGeneration;

impl TileGeneration for MiddleTileGeneration {
    fn kind(&self) -> GenerationStrategy {
        GenerationStrategy::Middle
    }

    fn generate(&self, anchor: Tile, start_level: u8, end_level: u8) -> Vec<Tile> {
        let depth = end_level.saturating_sub(start_level);
        expand_window(anchor, self.kind().levels_above_anchor(depth), depth)
    }
}

/// Anchor treated as the bottom of the window: walk up to the top first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildTileGeneration;

impl TileGeneration for ChildTileGeneration {
    fn kind(&self) -> GenerationStrategy {
        GenerationStrategy::Child
    }

    fn generate(&self, anchor: Tile, start_level: u8, end_level: u8) -> Vec<Tile> {
        let depth = end_level.saturating_sub(start_level);
        expand_window(anchor, self.kind().levels_above_anchor(depth), depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::subtree_node_count;

    fn all() -> [Box<dyn TileGeneration>; 3] {
        [
            Box::new(ParentTileGeneration),
            Box::new(MiddleTileGeneration),
            Box::new(ChildTileGeneration),
        ]
    }

    #[test]
    fn test_parent_expands_anchor_down_to_end_level() {
        let anchor = Tile::new_unchecked(77, 90, 8);
        let tiles = ParentTileGeneration.generate(anchor, 8, 10);

        assert_eq!(tiles.len(), 21);
        assert_eq!(tiles[0], anchor);
        assert!(tiles.iter().all(|t| anchor.is_ancestor_of(t)));
        assert_eq!(tiles.iter().map(|t| t.zoom).max(), Some(10));
    }

    #[test]
    fn test_child_walks_up_to_start_level() {
        let anchor = Tile::new_unchecked(77, 90, 8);
        let tiles = ChildTileGeneration.generate(anchor, 6, 8);

        let top = Tile::new_unchecked(19, 22, 6);
        assert_eq!(tiles.len(), 21);
        assert_eq!(tiles[0], top);
        assert!(tiles.contains(&anchor));
        assert_eq!(tiles.iter().map(|t| t.zoom).max(), Some(8));
    }

    #[test]
    fn test_middle_contains_ancestor_chain_and_anchor_subtree() {
        let anchor = Tile::new_unchecked(77, 90, 8);
        let tiles = MiddleTileGeneration.generate(anchor, 6, 10);

        // Window of 4 levels, anchor 2 below the top
        assert_eq!(tiles.len() as u64, subtree_node_count(4));
        assert_eq!(tiles[0], anchor.ancestor(6));
        assert!(tiles.contains(&anchor.ancestor(7)));
        assert!(tiles.contains(&anchor));
        for descendant in crate::coord::subtree_nodes(anchor, 10) {
            assert!(tiles.contains(&descendant));
        }
        assert_eq!(tiles.iter().map(|t| t.zoom).max(), Some(10));
    }

    #[test]
    fn test_zero_depth_window_is_single_tile() {
        let anchor = Tile::new_unchecked(5, 5, 4);
        for strategy in all() {
            assert_eq!(strategy.generate(anchor, 9, 9), vec![anchor]);
        }
    }

    #[test]
    fn test_inverted_window_is_single_tile() {
        let anchor = Tile::new_unchecked(5, 5, 4);
        for strategy in all() {
            assert_eq!(strategy.generate(anchor, 9, 3), vec![anchor]);
        }
    }

    #[test]
    fn test_deep_window_stops_at_max_zoom() {
        use crate::coord::MAX_ZOOM;

        let anchor = Tile::new((1 << 30) - 1, 0, MAX_ZOOM).unwrap();
        assert_eq!(ParentTileGeneration.generate(anchor, 27, 30), vec![anchor]);

        let middle = MiddleTileGeneration.generate(anchor, 27, 30);
        assert_eq!(middle.len() as u64, subtree_node_count(1));
        assert_eq!(middle[0], anchor.ancestor(MAX_ZOOM - 1));

        let child = ChildTileGeneration.generate(anchor, 27, 30);
        assert_eq!(child.len() as u64, subtree_node_count(3));

        for tiles in [middle, child] {
            assert!(tiles.iter().all(|t| t.is_valid() && t.zoom <= MAX_ZOOM));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_all_strategies_produce_same_count(
                col in 0u32..4096,
                row in 0u32..4096,
                start in 0u8..6,
                depth in 0u8..=4,
            ) {
                let anchor = Tile::new_unchecked(col, row, 12);
                let expected = subtree_node_count(depth);
                for strategy in all() {
                    let tiles = strategy.generate(anchor, start, start + depth);
                    prop_assert_eq!(tiles.len() as u64, expected, "{}", strategy.kind());
                }
            }

            #[test]
            fn test_strategies_contain_the_anchor(
                col in 0u32..4096,
                row in 0u32..4096,
                depth in 0u8..=3,
            ) {
                let anchor = Tile::new_unchecked(col, row, 12);
                for strategy in all() {
                    let tiles = strategy.generate(anchor, 9, 9 + depth);
                    prop_assert!(tiles.contains(&anchor));
                }
            }
        }
    }
}
