//! Tile addressing and quadtree math.
//!
//! Provides the [`Tile`] address type, the quadtree relations used to expand
//! a region into the tiles to fetch, and conversions between geographic
//! coordinates (latitude/longitude) and Web Mercator tile coordinates.

mod types;

pub use types::{CoordError, Tile, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM};

use std::f64::consts::PI;

/// Expands `root` into its subtree down to `max_zoom`.
///
/// Tiles are returned depth-first, root first, children in the order of
/// [`Tile::children`]. A `max_zoom` at or above the root's zoom yields
/// `4^0 + 4^1 + ... + 4^d` tiles where `d = max_zoom - root.zoom`; a
/// `max_zoom` below the root yields only the root. The walk never goes
/// past [`MAX_ZOOM`].
pub fn subtree_nodes(root: Tile, max_zoom: u8) -> Vec<Tile> {
    let max_zoom = max_zoom.min(MAX_ZOOM);
    let depth = max_zoom.saturating_sub(root.zoom);
    let mut nodes = Vec::with_capacity(subtree_node_count(depth).min(1 << 20) as usize);
    push_subtree(root, max_zoom, &mut nodes);
    nodes
}

fn push_subtree(tile: Tile, max_zoom: u8, out: &mut Vec<Tile>) {
    out.push(tile);
    if tile.zoom >= max_zoom {
        return;
    }
    for child in tile.children() {
        push_subtree(child, max_zoom, out);
    }
}

/// Number of tiles in a subtree of the given depth: `(4^(depth+1) - 1) / 3`.
///
/// Equal to `subtree_nodes(t, t.zoom + depth).len()` without materializing
/// the tree. Saturates at `u64::MAX` for depths beyond 30.
#[inline]
pub fn subtree_node_count(depth: u8) -> u64 {
    if depth >= 31 {
        return u64::MAX;
    }
    let four_pow = 1u64 << (2 * (depth as u32 + 1));
    (four_pow - 1) / 3
}

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 30)
///
/// Longitude 180.0 and the southern latitude limit map onto the last
/// column/row rather than one past it.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<Tile, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let last = (n as u64 - 1) as u32;

    let col = (((lon + 180.0) / 360.0 * n) as u64).min(last as u64) as u32;

    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    let row = (y.max(0.0) as u64).min(last as u64) as u32;

    Ok(Tile::new_unchecked(col, row, zoom))
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &Tile) -> (f64, f64) {
    corner_to_lat_lon(tile.col as f64, tile.row as f64, tile.zoom)
}

/// Geographic bounds of a tile as `(west, south, east, north)` in degrees.
pub fn tile_bounds(tile: &Tile) -> (f64, f64, f64, f64) {
    let (north, west) = corner_to_lat_lon(tile.col as f64, tile.row as f64, tile.zoom);
    let (south, east) =
        corner_to_lat_lon(tile.col as f64 + 1.0, tile.row as f64 + 1.0, tile.zoom);
    (west, south, east, north)
}

fn corner_to_lat_lon(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let lon = x / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    (lat_rad * 180.0 / PI, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let tile = to_tile_coords(40.7128, -74.0060, 16).unwrap();
        assert_eq!(tile.row, 24640);
        assert_eq!(tile.col, 19295);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_antimeridian_maps_to_last_column() {
        let tile = to_tile_coords(0.0, 180.0, 3).unwrap();
        assert_eq!(tile.col, 7);
        let tile = to_tile_coords(MIN_LAT, 0.0, 3).unwrap();
        assert_eq!(tile.row, 7);
    }

    #[test]
    fn test_tile_new_rejects_out_of_range() {
        assert!(Tile::new(3, 3, 2).is_ok());
        assert_eq!(
            Tile::new(4, 0, 2),
            Err(CoordError::OutOfRange {
                col: 4,
                row: 0,
                zoom: 2
            })
        );
        assert_eq!(Tile::new(0, 0, 31), Err(CoordError::InvalidZoom(31)));
    }

    #[test]
    fn test_children_of_tile() {
        let tile = Tile::new_unchecked(3, 5, 4);
        let children = tile.children();
        assert_eq!(
            children,
            [
                Tile::new_unchecked(6, 10, 5),
                Tile::new_unchecked(6, 11, 5),
                Tile::new_unchecked(7, 10, 5),
                Tile::new_unchecked(7, 11, 5),
            ]
        );
        for child in children {
            assert_eq!(child.parent(), Some(tile));
        }
    }

    #[test]
    fn test_children_tile_parent_extent_exactly() {
        let tile = Tile::new_unchecked(9, 6, 4);
        let (w, s, e, n) = tile_bounds(&tile);

        let bounds: Vec<_> = tile.children().iter().map(tile_bounds).collect();
        let min_w = bounds.iter().map(|b| b.0).fold(f64::INFINITY, f64::min);
        let min_s = bounds.iter().map(|b| b.1).fold(f64::INFINITY, f64::min);
        let max_e = bounds.iter().map(|b| b.2).fold(f64::NEG_INFINITY, f64::max);
        let max_n = bounds.iter().map(|b| b.3).fold(f64::NEG_INFINITY, f64::max);
        assert!((min_w - w).abs() < 1e-9);
        assert!((min_s - s).abs() < 1e-9);
        assert!((max_e - e).abs() < 1e-9);
        assert!((max_n - n).abs() < 1e-9);

        // Children share edges at the parent's midpoints and never overlap
        let mid_lon = (w + e) / 2.0;
        let (mid_lat, _) = corner_to_lat_lon(19.0, 13.0, 5);
        for (child, b) in tile.children().iter().zip(&bounds) {
            let west_half = child.col % 2 == 0;
            let north_half = child.row % 2 == 0;
            if west_half {
                assert!((b.2 - mid_lon).abs() < 1e-9);
            } else {
                assert!((b.0 - mid_lon).abs() < 1e-9);
            }
            if north_half {
                assert!((b.1 - mid_lat).abs() < 1e-9);
            } else {
                assert!((b.3 - mid_lat).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_ancestor_shifts_coordinates() {
        let tile = Tile::new_unchecked(77, 90, 8);
        assert_eq!(tile.ancestor(6), Tile::new_unchecked(19, 22, 6));
        assert_eq!(tile.ancestor(0), Tile::root());
        assert_eq!(tile.ancestor(8), tile);
        assert_eq!(tile.ancestor(12), tile);
        assert!(Tile::new_unchecked(19, 22, 6).is_ancestor_of(&tile));
        assert!(!Tile::new_unchecked(18, 22, 6).is_ancestor_of(&tile));
    }

    #[test]
    fn test_subtree_node_count_known_values() {
        assert_eq!(subtree_node_count(0), 1);
        assert_eq!(subtree_node_count(1), 5);
        assert_eq!(subtree_node_count(2), 21);
        assert_eq!(subtree_node_count(4), 341);
        assert_eq!(subtree_node_count(31), u64::MAX);
    }

    #[test]
    fn test_subtree_nodes_root_first_depth_first() {
        let root = Tile::new_unchecked(1, 2, 3);
        let nodes = subtree_nodes(root, 5);

        assert_eq!(nodes.len(), 21);
        assert_eq!(nodes[0], root);
        assert_eq!(nodes[1], root.children()[0]);
        // The first child's own children come before the second child
        assert_eq!(nodes[2], root.children()[0].children()[0]);
        assert_eq!(nodes[6], root.children()[1]);
    }

    #[test]
    fn test_subtree_nodes_at_max_zoom_is_root_only() {
        let root = Tile::new_unchecked(4, 4, 6);
        assert_eq!(subtree_nodes(root, 6), vec![root]);
        assert_eq!(subtree_nodes(root, 2), vec![root]);
    }

    #[test]
    fn test_subtree_nodes_stop_at_max_zoom() {
        let deepest = Tile::new((1 << 30) - 1, 0, MAX_ZOOM).unwrap();
        assert_eq!(subtree_nodes(deepest, 33), vec![deepest]);

        let root = Tile::new_unchecked(0, 0, MAX_ZOOM - 1);
        let nodes = subtree_nodes(root, u8::MAX);
        assert_eq!(nodes.len() as u64, subtree_node_count(1));
        assert!(nodes.iter().all(Tile::is_valid));
    }

    #[test]
    fn test_subtree_nodes_are_unique_descendants() {
        let root = Tile::new_unchecked(2, 1, 2);
        let nodes = subtree_nodes(root, 5);
        let unique: HashSet<_> = nodes.iter().copied().collect();
        assert_eq!(unique.len(), nodes.len());
        assert!(nodes.iter().all(|t| root.is_ancestor_of(t) && t.is_valid()));
    }

    #[test]
    fn test_tile_bounds_of_root() {
        let (w, s, e, n) = tile_bounds(&Tile::root());
        assert!((w + 180.0).abs() < 1e-9);
        assert!((e - 180.0).abs() < 1e-9);
        assert!((n - MAX_LAT).abs() < 1e-6);
        assert!((s - MIN_LAT).abs() < 1e-6);
    }

    #[test]
    fn test_tile_display() {
        assert_eq!(Tile::new_unchecked(19295, 24640, 16).to_string(), "16/19295/24640");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_subtree_length_matches_closed_form(
                col in 0u32..64,
                row in 0u32..64,
                depth in 0u8..=4
            ) {
                let root = Tile::new_unchecked(col, row, 6);
                let nodes = subtree_nodes(root, root.zoom + depth);
                prop_assert_eq!(nodes.len() as u64, subtree_node_count(depth));
            }

            #[test]
            fn test_tile_coords_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                prop_assert!(tile.is_valid());
                prop_assert_eq!(tile.zoom, zoom);
            }

            #[test]
            fn test_point_lies_inside_its_tile(
                lat in -85.0..85.0_f64,
                lon in -179.9..179.9_f64,
                zoom in 0u8..=16
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                let (w, s, e, n) = tile_bounds(&tile);
                prop_assert!(lon >= w - 1e-9 && lon <= e + 1e-9);
                prop_assert!(lat >= s - 1e-9 && lat <= n + 1e-9);
            }

            #[test]
            fn test_children_parent_roundtrip(
                col in 0u32..1024,
                row in 0u32..1024,
            ) {
                let tile = Tile::new_unchecked(col, row, 10);
                for child in tile.children() {
                    prop_assert_eq!(child.parent(), Some(tile));
                    prop_assert_eq!(child.ancestor(10), tile);
                }
            }
        }
    }
}
