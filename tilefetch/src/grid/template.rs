//! URL templates for XYZ tile servers.
//!
//! Templates use the placeholders common to slippy-map servers:
//!
//! | Placeholder | Value                        |
//! |-------------|------------------------------|
//! | `{z}`       | zoom level                   |
//! | `{x}`       | column                       |
//! | `{y}`       | row, counted from the north  |
//! | `{-y}`      | row, counted from the south  |
//!
//! ```
//! use tilefetch::coord::Tile;
//! use tilefetch::grid::{TileGrid, UrlTemplate};
//!
//! let template = UrlTemplate::parse("https://tiles.example.com/{z}/{x}/{y}.png").unwrap();
//! let url = template.url_for(&Tile::new(3, 5, 4).unwrap(), &TileGrid::default()).unwrap();
//! assert_eq!(url, "https://tiles.example.com/4/3/5.png");
//! ```

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::TileGrid;
use crate::coord::Tile;

/// Errors from parsing or expanding a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template contains a placeholder this crate cannot expand
    #[error("Unsupported placeholder '{placeholder}' in template '{template}'")]
    UnsupportedPlaceholder {
        template: String,
        placeholder: String,
    },

    /// The template has no tile placeholder at all
    #[error("Template '{0}' does not reference any tile coordinate")]
    NoPlaceholders(String),

    /// The tile is not part of the grid
    #[error("Tile {0} is outside the tile grid")]
    OutOfGrid(Tile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Zoom,
    Col,
    Row,
    InvertedRow,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"))
}

/// Parsed XYZ URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parses a template, rejecting unknown placeholders up front.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut last = 0;
        let mut has_placeholder = false;

        for caps in placeholder_regex().captures_iter(template) {
            let whole = caps.get(0).expect("capture 0 is the whole match");
            if whole.start() > last {
                segments.push(Segment::Literal(template[last..whole.start()].to_string()));
            }
            let segment = match &caps[1] {
                "z" => Segment::Zoom,
                "x" => Segment::Col,
                "y" => Segment::Row,
                "-y" => Segment::InvertedRow,
                other => {
                    return Err(TemplateError::UnsupportedPlaceholder {
                        template: template.to_string(),
                        placeholder: format!("{{{}}}", other),
                    })
                }
            };
            segments.push(segment);
            has_placeholder = true;
            last = whole.end();
        }

        if !has_placeholder {
            return Err(TemplateError::NoPlaceholders(template.to_string()));
        }
        if last < template.len() {
            segments.push(Segment::Literal(template[last..].to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template text this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Expands the template for a tile.
    ///
    /// Fails when the tile does not exist in `grid`.
    pub fn url_for(&self, tile: &Tile, grid: &TileGrid) -> Result<String, TemplateError> {
        if !grid.contains(tile) {
            return Err(TemplateError::OutOfGrid(*tile));
        }

        let mut url = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Zoom => url.push_str(&tile.zoom.to_string()),
                Segment::Col => url.push_str(&tile.col.to_string()),
                Segment::Row => url.push_str(&tile.row.to_string()),
                Segment::InvertedRow => {
                    let inverted = tile.tiles_per_axis() - 1 - tile.row as u64;
                    url.push_str(&inverted.to_string());
                }
            }
        }
        Ok(url)
    }
}
