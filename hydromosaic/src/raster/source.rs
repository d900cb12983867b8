//! Raster source trait and in-memory implementation.

use super::types::{Grid, RasterMeta};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Errors raised while reading raster files.
#[derive(Debug, Error)]
pub enum RasterError {
    /// File I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TIFF decoding error
    #[error("TIFF error in {path}: {message}")]
    Tiff { path: PathBuf, message: String },

    /// Missing or invalid geotransform tags
    #[error("missing geotransform in {path}: {reason}")]
    MissingGeotransform { path: PathBuf, reason: String },

    /// The file format is not supported by this source
    #[error("unsupported raster format: {0}")]
    Unsupported(PathBuf),

    /// No raster is registered under this path
    #[error("raster not found: {0}")]
    NotFound(PathBuf),
}

/// Supplier of per-file georeferencing metadata and elevation values.
///
/// The tile index only needs [`metadata`](RasterSource::metadata); workers
/// call [`read_elevation`](RasterSource::read_elevation) from their own
/// threads, so implementations must be `Send + Sync`.
pub trait RasterSource: Send + Sync {
    /// Read bounds, resolution and shape of the raster at `path`.
    fn metadata(&self, path: &Path) -> Result<RasterMeta, RasterError>;

    /// Read the full elevation band of the raster at `path`.
    fn read_elevation(&self, path: &Path) -> Result<Grid<f32>, RasterError>;

    /// Whether this source can read the file at `path`.
    ///
    /// Directory discovery skips files a source does not support instead of
    /// failing on them.
    fn supports(&self, _path: &Path) -> bool {
        true
    }
}

/// Raster source backed by an in-memory map.
///
/// Used by tests and by callers that synthesize tiles programmatically.
#[derive(Default)]
pub struct MemoryRasterSource {
    rasters: RwLock<HashMap<PathBuf, (RasterMeta, Grid<f32>)>>,
}

impl MemoryRasterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under `path`, replacing any previous entry.
    pub fn insert(&self, path: impl Into<PathBuf>, meta: RasterMeta, elevation: Grid<f32>) {
        self.rasters
            .write()
            .unwrap()
            .insert(path.into(), (meta, elevation));
    }

    /// Number of registered rasters.
    pub fn len(&self) -> usize {
        self.rasters.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.rasters.read().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl RasterSource for MemoryRasterSource {
    fn metadata(&self, path: &Path) -> Result<RasterMeta, RasterError> {
        self.rasters
            .read()
            .unwrap()
            .get(path)
            .map(|(meta, _)| *meta)
            .ok_or_else(|| RasterError::NotFound(path.to_path_buf()))
    }

    fn read_elevation(&self, path: &Path) -> Result<Grid<f32>, RasterError> {
        self.rasters
            .read()
            .unwrap()
            .get(path)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| RasterError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Resolution;

    #[test]
    fn test_memory_source_round_trip() {
        let source = MemoryRasterSource::new();
        let meta = RasterMeta::from_origin(0.0, 1.0, Resolution::new(0.25, -0.25), 4, 4);
        source.insert("a.tif", meta, Grid::filled(4, 4, 3.0));

        assert_eq!(source.metadata(Path::new("a.tif")).unwrap(), meta);
        assert_eq!(source.read_elevation(Path::new("a.tif")).unwrap().get(3, 3), 3.0);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_memory_source_missing_path() {
        let source = MemoryRasterSource::new();
        let err = source.metadata(Path::new("missing.tif")).unwrap_err();
        assert!(matches!(err, RasterError::NotFound(_)));
    }
}
