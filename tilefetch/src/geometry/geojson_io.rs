//! GeoJSON conversion for drawn region geometries.
//!
//! Regions are drawn and persisted as GeoJSON text; tile selection works on
//! `geo` geometries. Accepts a bare Geometry, a Feature or a
//! FeatureCollection. Features without a geometry are skipped.

use geo::Geometry;
use geojson::GeoJson;
use thiserror::Error;

/// Errors from reading GeoJSON geometries.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The text is not valid GeoJSON
    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    /// The GeoJSON holds a geometry that cannot be represented
    #[error("Unsupported geometry: {0}")]
    Unsupported(String),
}

/// Parses GeoJSON text into geometries.
pub fn parse_geojson(text: &str) -> Result<Vec<Geometry<f64>>, GeometryError> {
    let geojson: GeoJson = text.parse()?;

    let raw: Vec<geojson::Geometry> = match geojson {
        GeoJson::Geometry(geometry) => vec![geometry],
        GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .filter_map(|f| f.geometry)
            .collect(),
    };

    raw.into_iter()
        .map(|g| {
            Geometry::<f64>::try_from(g).map_err(|e| GeometryError::Unsupported(e.to_string()))
        })
        .collect()
}

/// Serialises a geometry as a GeoJSON Geometry object.
pub fn to_geojson_string(geometry: &Geometry<f64>) -> String {
    geojson::Geometry::new(geojson::Value::from(geometry)).to_string()
}
