//! Tile grid description and URL templating.
//!
//! A [`TileGrid`] answers "which part of the map does this tile cover" and
//! "does this tile exist", while a [`UrlTemplate`] turns a tile address into
//! the URL a tile server expects.

mod template;

pub use template::{TemplateError, UrlTemplate};

use geo::{coord, Rect};

use crate::coord::{tile_bounds, Tile, MAX_ZOOM};

/// Web Mercator XYZ tile grid.
///
/// Extents are expressed in longitude/latitude degrees so they can be
/// compared directly with geometries drawn in EPSG:4326.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    min_zoom: u8,
    max_zoom: u8,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::web_mercator()
    }
}

impl TileGrid {
    /// Grid covering every zoom level of the addressing scheme.
    pub fn web_mercator() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: MAX_ZOOM,
        }
    }

    /// Grid restricted to a zoom range, as most tile servers are.
    pub fn with_zoom_range(min_zoom: u8, max_zoom: u8) -> Self {
        let max_zoom = max_zoom.min(MAX_ZOOM);
        Self {
            min_zoom: min_zoom.min(max_zoom),
            max_zoom,
        }
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Whether the tile exists in this grid.
    pub fn contains(&self, tile: &Tile) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&tile.zoom) && tile.is_valid()
    }

    /// Rectangular extent of a tile in lon/lat degrees.
    pub fn tile_extent(&self, tile: &Tile) -> Rect<f64> {
        let (west, south, east, north) = tile_bounds(tile);
        Rect::new(coord! { x: west, y: south }, coord! { x: east, y: north })
    }
}
