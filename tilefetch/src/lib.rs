//! tilefetch - Offline map region downloads
//!
//! This library turns a region picked on a map into the set of XYZ tiles
//! covering it, downloads them with a bounded pool of workers and estimates
//! what a download or an edit of a stored region will cost.
//!
//! # High-Level API
//!
//! ```ignore
//! use tilefetch::config::DownloaderConfig;
//! use tilefetch::download::TileDownloader;
//! use tilefetch::generation::{GenerationStrategy, TileGenerationParams};
//! use tilefetch::grid::{TileGrid, UrlTemplate};
//! use tilefetch::provider::ReqwestTileClient;
//! use tilefetch::store::MemoryTileStore;
//!
//! let config = DownloaderConfig::default();
//! let client = ReqwestTileClient::new(&config)?;
//! let downloader = TileDownloader::new(client, MemoryTileStore::default(), config)?;
//!
//! let template = UrlTemplate::parse("https://tile.openstreetmap.org/{z}/{x}/{y}.png")?;
//! let params = TileGenerationParams::new(12, 15, GenerationStrategy::Parent)?;
//! downloader.download_from_tile(anchor, "quebec", &params, &TileGrid::default(), &template);
//! downloader.wait_until_idle().await;
//! ```
//!
//! # Modules
//!
//! - [`coord`]: tile addresses and quadtree math
//! - [`grid`]: tile extents and URL templates
//! - [`geometry`]: tile/geometry intersection and GeoJSON input
//! - [`generation`]: parent, middle and child tile generation
//! - [`download`]: the download scheduler
//! - [`estimate`]: download size estimates
//! - [`region`]: stored region records

pub mod config;
pub mod coord;
pub mod download;
pub mod estimate;
pub mod generation;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod provider;
pub mod region;
pub mod store;

/// Version of the tilefetch library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
