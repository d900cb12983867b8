//! Tile index: per-file georeferencing for every input raster.
//!
//! The index is built once per run and is read-only afterwards. Tile
//! positions in the index are the stable tile identifiers used by the
//! success table, the overlap geometry and the scheduler.

use crate::raster::{Bounds, RasterError, RasterMeta, RasterSource, Resolution};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions recognised as elevation inputs.
pub const INPUT_FILE_TYPES: &[&str] = &[
    "tif", "tiff", "vrt", "hgt", "flt", "adf", "grib", "grib2", "grb", "gr1",
];

/// Errors that can occur while building the tile index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The input directory could not be listed
    #[error("failed to list input directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A raster's metadata could not be read
    #[error("failed to index {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: RasterError,
    },
}

/// One input raster and its placement on the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Source file
    pub path: PathBuf,
    /// Georeferencing metadata
    pub meta: RasterMeta,
}

impl Tile {
    pub fn new(path: impl Into<PathBuf>, meta: RasterMeta) -> Self {
        Self {
            path: path.into(),
            meta,
        }
    }

    #[inline]
    pub fn bounds(&self) -> &Bounds {
        &self.meta.bounds
    }

    #[inline]
    pub fn resolution(&self) -> &Resolution {
        &self.meta.resolution
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.meta.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.meta.cols
    }
}

/// Ordered collection of tiles.
#[derive(Debug, Clone, Default)]
pub struct TileIndex {
    tiles: Vec<Tile>,
}

impl TileIndex {
    /// Create an index from already-read tiles, preserving their order.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    /// Read metadata for every path, in order.
    ///
    /// The first unreadable file aborts construction.
    pub fn build<P: AsRef<Path>>(
        paths: &[P],
        source: &dyn RasterSource,
    ) -> Result<Self, IndexError> {
        let mut tiles = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let meta = source.metadata(path).map_err(|source| IndexError::Metadata {
                path: path.to_path_buf(),
                source,
            })?;
            tiles.push(Tile::new(path, meta));
        }
        Ok(Self { tiles })
    }

    /// Discover input files in `dir` and index the ones `source` can read.
    pub fn from_directory(dir: &Path, source: &dyn RasterSource) -> Result<Self, IndexError> {
        let paths: Vec<PathBuf> = discover_elevation_files(dir)?
            .into_iter()
            .filter(|path| source.supports(path))
            .collect();
        Self::build(&paths, source)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }
}

impl std::ops::Index<usize> for TileIndex {
    type Output = Tile;

    fn index(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }
}

/// List elevation files directly inside `dir`, sorted by path.
pub fn discover_elevation_files(dir: &Path) -> Result<Vec<PathBuf>, IndexError> {
    let entries = fs::read_dir(dir).map_err(|source| IndexError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_input_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| INPUT_FILE_TYPES.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
