//! Raster metadata and elevation access.
//!
//! The orchestration layer only depends on the [`RasterSource`] trait; the
//! shipped implementations are [`GeoTiffSource`] for files on disk and
//! [`MemoryRasterSource`] for synthesized tiles.

mod geotiff;
mod source;
mod types;

pub use geotiff::GeoTiffSource;
pub use source::{MemoryRasterSource, RasterError, RasterSource};
pub use types::{Bounds, Grid, RasterMeta, Resolution, ShapeMismatch};
