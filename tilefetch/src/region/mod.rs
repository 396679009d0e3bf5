//! Stored region descriptions.
//!
//! A [`RegionRecord`] is what the host persists after a download: the
//! anchors the user picked, the drawn geometries as GeoJSON text and the
//! generation parameters. The estimator diffs a proposed edit against it.

use geo::Geometry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::Tile;
use crate::generation::TileGenerationParams;
use crate::geometry::{parse_geojson, to_geojson_string, GeometryError};
use crate::grid::{TemplateError, TileGrid, UrlTemplate};

/// Errors from reading or writing region records.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Invalid region JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid region geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// An anchor tile picked by the user and the URL it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileToDownload {
    pub tile: Tile,
    pub url: String,
}

impl TileToDownload {
    /// Resolves the URL of `tile` through `template`.
    pub fn resolve(tile: Tile, template: &UrlTemplate, grid: &TileGrid) -> Result<Self, TemplateError> {
        Ok(Self {
            url: template.url_for(&tile, grid)?,
            tile,
        })
    }
}

/// A downloaded region as persisted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    pub name: String,
    /// Anchors picked on the map
    #[serde(default)]
    pub anchors: Vec<TileToDownload>,
    pub generation_params: TileGenerationParams,
    /// Drawn geometries, one GeoJSON geometry object each
    #[serde(default)]
    pub geometries: Vec<String>,
    /// URLs queued when the region was downloaded
    #[serde(default)]
    pub tile_count: u64,
}

impl RegionRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, params: TileGenerationParams) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            anchors: Vec::new(),
            generation_params: params,
            geometries: Vec::new(),
            tile_count: 0,
        }
    }

    pub fn with_anchors(mut self, anchors: Vec<TileToDownload>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Stores the geometries as GeoJSON text.
    pub fn with_geometries(mut self, geometries: &[Geometry<f64>]) -> Self {
        self.geometries = geometries.iter().map(to_geojson_string).collect();
        self
    }

    pub fn with_tile_count(mut self, tile_count: u64) -> Self {
        self.tile_count = tile_count;
        self
    }

    pub fn anchor_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.anchors.iter().map(|a| a.tile)
    }

    /// Parses the stored geometries.
    pub fn parsed_geometries(&self) -> Result<Vec<Geometry<f64>>, GeometryError> {
        let mut geometries = Vec::with_capacity(self.geometries.len());
        for text in &self.geometries {
            geometries.extend(parse_geojson(text)?);
        }
        Ok(geometries)
    }

    pub fn to_json(&self) -> Result<String, RegionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, RegionError> {
        Ok(serde_json::from_str(text)?)
    }
}
