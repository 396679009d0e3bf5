//! Geometry-driven tile selection.
//!
//! Shared by every strategy: the anchor placement only matters for a single
//! picked tile, a drawn area already defines its own footprint.

use std::collections::HashSet;

use geo::{BoundingRect, Geometry};
use tracing::debug;

use crate::coord::{to_tile_coords, Tile, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};
use crate::geometry::tile_intersects;
use crate::grid::TileGrid;

/// Distinct tiles at `start_level` whose extent intersects any geometry.
///
/// Order follows the geometries, then column-major inside each bounding box.
pub fn start_level_anchors(
    geometries: &[Geometry<f64>],
    start_level: u8,
    grid: &TileGrid,
) -> Vec<Tile> {
    let mut seen = HashSet::new();
    let mut anchors = Vec::new();
    for geometry in geometries {
        for tile in anchors_for(geometry, start_level, grid) {
            if seen.insert(tile) {
                anchors.push(tile);
            }
        }
    }
    anchors
}

/// Depth-first walk from `tile` down to `end_level`, entering only children
/// whose extent still intersects `geometry`.
///
/// `tile` itself is always pushed; the caller has already tested it.
pub fn expand_pruned(
    tile: Tile,
    geometry: &Geometry<f64>,
    end_level: u8,
    grid: &TileGrid,
    out: &mut Vec<Tile>,
) {
    out.push(tile);
    if tile.zoom >= end_level.min(MAX_ZOOM) {
        return;
    }
    for child in tile.children() {
        if tile_intersects(geometry, &grid.tile_extent(&child)) {
            expand_pruned(child, geometry, end_level, grid, out);
        }
    }
}

pub(super) fn generate_from_geometries(
    geometries: &[Geometry<f64>],
    start_level: u8,
    end_level: u8,
    grid: &TileGrid,
) -> Vec<Tile> {
    let mut seen = HashSet::new();
    let mut tiles = Vec::new();
    let mut walk = Vec::new();

    for geometry in geometries {
        for anchor in anchors_for(geometry, start_level, grid) {
            walk.clear();
            expand_pruned(anchor, geometry, end_level, grid, &mut walk);
            tiles.extend(walk.iter().copied().filter(|t| seen.insert(*t)));
        }
    }

    debug!(
        geometries = geometries.len(),
        start_level,
        end_level,
        tiles = tiles.len(),
        "Generated tiles from geometries"
    );
    tiles
}

/// Start-level tiles inside the geometry's bounding box that intersect it.
fn anchors_for(geometry: &Geometry<f64>, zoom: u8, grid: &TileGrid) -> Vec<Tile> {
    let Some(bbox) = geometry.bounding_rect() else {
        return Vec::new();
    };

    let west = bbox.min().x.clamp(MIN_LON, MAX_LON);
    let east = bbox.max().x.clamp(MIN_LON, MAX_LON);
    let south = bbox.min().y.clamp(MIN_LAT, MAX_LAT);
    let north = bbox.max().y.clamp(MIN_LAT, MAX_LAT);

    // NaN survives clamp and is rejected here
    let (Ok(north_west), Ok(south_east)) = (
        to_tile_coords(north, west, zoom),
        to_tile_coords(south, east, zoom),
    ) else {
        return Vec::new();
    };

    let mut anchors = Vec::new();
    for col in north_west.col..=south_east.col {
        for row in north_west.row..=south_east.row {
            let tile = Tile::new_unchecked(col, row, zoom);
            if grid.contains(&tile) && tile_intersects(geometry, &grid.tile_extent(&tile)) {
                anchors.push(tile);
            }
        }
    }
    anchors
}
