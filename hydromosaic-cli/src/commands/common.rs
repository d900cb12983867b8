//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use hydromosaic::config::{ConfigFile, StoreFormat};
use hydromosaic::index::TileIndex;
use hydromosaic::log::Logger;
use hydromosaic::raster::RasterSource;
use hydromosaic::store::{ChunkedStore, DirectoryStore, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CliError;

/// Output store selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StoreKind {
    /// One directory per array on disk (resumable)
    Directory,
    /// In-process memory only (dry run)
    Memory,
}

impl From<StoreKind> for StoreFormat {
    fn from(kind: StoreKind) -> Self {
        match kind {
            StoreKind::Directory => StoreFormat::Directory,
            StoreKind::Memory => StoreFormat::Memory,
        }
    }
}

/// Resolve the input directory: CLI takes precedence, then config.
pub fn resolve_input(cli_input: Option<PathBuf>, config: &ConfigFile) -> Result<PathBuf, CliError> {
    cli_input
        .or_else(|| config.input.directory.clone())
        .ok_or(CliError::MissingInput)
}

/// Index every elevation file in `dir` that `source` can read.
pub fn index_tiles(dir: &Path, source: &dyn RasterSource) -> Result<TileIndex, CliError> {
    let index = TileIndex::from_directory(dir, source)?;
    if index.is_empty() {
        return Err(CliError::Config(format!(
            "No supported elevation files found in {}",
            dir.display()
        )));
    }
    Ok(index)
}

/// Open the output store.
pub fn open_store(
    format: StoreFormat,
    path: &Path,
    logger: Arc<dyn Logger>,
) -> Result<Arc<dyn ChunkedStore>, CliError> {
    let store: Arc<dyn ChunkedStore> = match format {
        StoreFormat::Directory => Arc::new(DirectoryStore::new(path)?.with_logger(logger)),
        StoreFormat::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydromosaic::log::NoOpLogger;
    use hydromosaic::raster::GeoTiffSource;

    #[test]
    fn test_cli_input_wins() {
        let mut config = ConfigFile::default();
        config.input.directory = Some(PathBuf::from("/from/config"));

        let input = resolve_input(Some(PathBuf::from("/from/cli")), &config).unwrap();
        assert_eq!(input, PathBuf::from("/from/cli"));

        let input = resolve_input(None, &config).unwrap();
        assert_eq!(input, PathBuf::from("/from/config"));
    }

    #[test]
    fn test_missing_input() {
        let result = resolve_input(None, &ConfigFile::default());
        assert!(matches!(result, Err(CliError::MissingInput)));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = hydromosaic::raster::MemoryRasterSource::new();
        let result = index_tiles(temp_dir.path(), &source);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_unsupported_files_only_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("n45w120.hgt"), b"").unwrap();
        let result = index_tiles(temp_dir.path(), &GeoTiffSource::new());
        match result {
            Err(CliError::Config(message)) => assert!(message.contains("No supported")),
            other => panic!("unexpected result: {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_open_directory_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("out");
        let store = open_store(StoreFormat::Directory, &path, Arc::new(NoOpLogger)).unwrap();
        assert!(!store.contains("elev"));
    }
}
