//! hydromosaic - tiled elevation mosaics with cross-tile flow accumulation
//!
//! Elevation data often arrives as many independently georeferenced files,
//! sometimes at different resolutions. This library assembles them into one
//! logical mosaic stored in a chunked array store, runs per-tile terrain
//! stages on a bounded worker pool, and then iterates boundary corrections
//! between neighboring tiles until upstream contributing area has flowed
//! across every seam.
//!
//! # High-Level API
//!
//! ```no_run
//! use hydromosaic::index::TileIndex;
//! use hydromosaic::log::TracingLogger;
//! use hydromosaic::pipeline::{Pipeline, PipelineOptions};
//! use hydromosaic::raster::GeoTiffSource;
//! use hydromosaic::store::DirectoryStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let source = Arc::new(GeoTiffSource::new());
//! let index = TileIndex::from_directory(Path::new("srtm/"), source.as_ref())?;
//! let store = Arc::new(DirectoryStore::new("out/")?);
//! let mut pipeline = Pipeline::new(
//!     index,
//!     source,
//!     store,
//!     Arc::new(TracingLogger),
//!     PipelineOptions::default(),
//! );
//! let summary = pipeline.process_all()?;
//! println!("{}", summary);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod edge;
pub mod grid;
pub mod index;
pub mod kernel;
pub mod log;
pub mod logging;
pub mod pipeline;
pub mod raster;
pub mod stage;
pub mod store;

/// Version of the hydromosaic library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
