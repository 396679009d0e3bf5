//! Tile type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom range supported by the tile addressing scheme.
///
/// 30 keeps `2^zoom` (and the children of a max-zoom tile) inside `u32`.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 30;

/// Tile address in the slippy-map (XYZ) scheme.
///
/// A tile is one quadrant of the globe at a given zoom level. Column grows
/// eastward from the antimeridian, row grows southward from the north edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    /// X coordinate (east-west), 0 at west
    pub col: u32,
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// Zoom level
    pub zoom: u8,
}

impl Tile {
    /// Creates a tile, checking `col, row < 2^zoom`.
    pub fn new(col: u32, row: u32, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = 1u64 << zoom;
        if col as u64 >= n || row as u64 >= n {
            return Err(CoordError::OutOfRange { col, row, zoom });
        }
        Ok(Self { col, row, zoom })
    }

    /// Creates a tile without range validation.
    ///
    /// Only for addresses derived from an already valid tile.
    #[inline]
    pub const fn new_unchecked(col: u32, row: u32, zoom: u8) -> Self {
        Self { col, row, zoom }
    }

    /// The root tile covering the whole world.
    pub const fn root() -> Self {
        Self::new_unchecked(0, 0, 0)
    }

    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u64 {
        1u64 << self.zoom
    }

    /// Whether `col` and `row` are inside the grid for `zoom`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        let n = self.tiles_per_axis();
        self.zoom <= MAX_ZOOM && (self.col as u64) < n && (self.row as u64) < n
    }

    /// Returns the four tiles covering this tile at `zoom + 1`.
    ///
    /// Order is column-major: `(2c, 2r)`, `(2c, 2r+1)`, `(2c+1, 2r)`,
    /// `(2c+1, 2r+1)`.
    #[inline]
    pub fn children(&self) -> [Tile; 4] {
        let x0 = self.col * 2;
        let y0 = self.row * 2;
        let z = self.zoom + 1;
        [
            Tile::new_unchecked(x0, y0, z),
            Tile::new_unchecked(x0, y0 + 1, z),
            Tile::new_unchecked(x0 + 1, y0, z),
            Tile::new_unchecked(x0 + 1, y0 + 1, z),
        ]
    }

    /// Returns the tile one level up, or `None` at zoom 0.
    #[inline]
    pub fn parent(&self) -> Option<Tile> {
        if self.zoom == 0 {
            return None;
        }
        Some(Tile::new_unchecked(self.col >> 1, self.row >> 1, self.zoom - 1))
    }

    /// Returns the tile containing this one at a lower `zoom`.
    ///
    /// A `zoom` at or above this tile's own level returns the tile itself.
    #[inline]
    pub fn ancestor(&self, zoom: u8) -> Tile {
        if zoom >= self.zoom {
            return *self;
        }
        let shift = self.zoom - zoom;
        Tile::new_unchecked(self.col >> shift, self.row >> shift, zoom)
    }

    /// Whether `other` lies in the subtree rooted at this tile.
    pub fn is_ancestor_of(&self, other: &Tile) -> bool {
        other.zoom >= self.zoom && other.ancestor(self.zoom) == *self
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Errors that can occur while building or converting tile addresses.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the Web Mercator range
    #[error("Invalid latitude: {0} (must be between {MIN_LAT} and {MAX_LAT})")]
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    #[error("Invalid longitude: {0} (must be between {MIN_LON} and {MAX_LON})")]
    InvalidLongitude(f64),
    /// Zoom level is above the supported maximum
    #[error("Invalid zoom level: {0} (must be between {MIN_ZOOM} and {MAX_ZOOM})")]
    InvalidZoom(u8),
    /// Column or row does not exist at the given zoom
    #[error("Tile {col},{row} does not exist at zoom {zoom}")]
    OutOfRange { col: u32, row: u32, zoom: u8 },
}
