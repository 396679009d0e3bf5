//! Tile-extent vs geometry predicates.
//!
//! Geometry-driven generation asks one question over and over: does this
//! tile's rectangle touch the area the user drew? The answer depends on the
//! kind of geometry:
//!
//! - **Polygons** must share area with the tile. A neighbouring tile that only
//!   shares an edge or a corner is not selected.
//! - **Lines** must cross the tile's boundary, or, when no crossing exists,
//!   start or end inside the tile (a short line drawn entirely inside one
//!   tile).
//! - **Points** must lie inside the tile, boundary included.
//!
//! Malformed input (empty geometries, non-finite coordinates, degenerate
//! rings, unsupported geometry kinds) never errors here: it simply does not
//! intersect anything.

mod geojson_io;

pub use geojson_io::{parse_geojson, to_geojson_string, GeometryError};

use geo::{Area, BooleanOps, CoordsIter, Geometry, Intersects, LineString, Point, Polygon, Rect};
use tracing::trace;

/// Returns true if `geometry` intersects the tile `extent`.
pub fn tile_intersects(geometry: &Geometry<f64>, extent: &Rect<f64>) -> bool {
    if !is_well_formed(geometry) {
        trace!("Skipping malformed geometry");
        return false;
    }

    match geometry {
        Geometry::Polygon(polygon) => polygon_intersects(polygon, extent),
        Geometry::MultiPolygon(polygons) => {
            polygons.iter().any(|p| polygon_intersects(p, extent))
        }
        Geometry::Rect(rect) => polygon_intersects(&rect.to_polygon(), extent),
        Geometry::Triangle(triangle) => polygon_intersects(&triangle.to_polygon(), extent),
        Geometry::LineString(line) => line_intersects(line, extent),
        Geometry::MultiLineString(lines) => lines.iter().any(|l| line_intersects(l, extent)),
        Geometry::Line(line) => line_intersects(&LineString::from(*line), extent),
        Geometry::Point(point) => extent_contains(extent, point),
        Geometry::MultiPoint(points) => points.iter().any(|p| extent_contains(extent, p)),
        Geometry::GeometryCollection(_) => {
            trace!("Geometry collections are not supported for tile selection");
            false
        }
    }
}

fn is_well_formed(geometry: &Geometry<f64>) -> bool {
    let mut coords = geometry.coords_iter().peekable();
    if coords.peek().is_none() {
        return false;
    }
    coords.all(|c| c.x.is_finite() && c.y.is_finite())
}

/// Area intersection: the interiors must overlap, touching is not enough.
fn polygon_intersects(polygon: &Polygon<f64>, extent: &Rect<f64>) -> bool {
    // A closed ring needs at least 3 distinct points plus the closing one
    if polygon.exterior().0.len() < 4 {
        return false;
    }
    let tile = extent.to_polygon();
    if !polygon.intersects(&tile) {
        return false;
    }
    polygon.intersection(&tile).unsigned_area() > 0.0
}

/// Segment intersection with the tile boundary, falling back to endpoint
/// containment for lines that never leave the tile.
fn line_intersects(line: &LineString<f64>, extent: &Rect<f64>) -> bool {
    if line.0.is_empty() {
        return false;
    }
    let boundary = extent.to_polygon().exterior().clone();
    if line.0.len() >= 2 && line.intersects(&boundary) {
        return true;
    }

    let first = line.0.first().map(|c| Point::from(*c));
    let last = line.0.last().map(|c| Point::from(*c));
    [first, last]
        .into_iter()
        .flatten()
        .any(|p| extent_contains(extent, &p))
}

/// Point-in-rectangle, boundary inclusive.
fn extent_contains(extent: &Rect<f64>, point: &Point<f64>) -> bool {
    let (min, max) = (extent.min(), extent.max());
    (min.x..=max.x).contains(&point.x()) && (min.y..=max.y).contains(&point.y())
}
