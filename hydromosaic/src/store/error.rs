//! Store error types.

use super::block::DType;
use crate::grid::Region;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`ChunkedStore`](super::ChunkedStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Array was never opened
    #[error("unknown array '{0}'")]
    UnknownArray(String),

    /// Re-opening an array with a different shape or dtype
    #[error("array '{name}' already exists with {existing}, requested {requested}")]
    SpecMismatch {
        name: String,
        existing: String,
        requested: String,
    },

    /// Block dtype does not match the array
    #[error("array '{name}' holds {expected} values, got {found}")]
    DTypeMismatch {
        name: String,
        expected: DType,
        found: DType,
    },

    /// Region does not fit in the array
    #[error("region {region} is outside array '{name}' of shape {shape:?}")]
    RegionOutOfBounds {
        name: String,
        region: Region,
        shape: (usize, usize),
    },

    /// Block shape does not match the region being written
    #[error("block of shape {found:?} cannot fill region of shape {expected:?} in '{name}'")]
    BlockShape {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Array metadata could not be read or written
    #[error("invalid array metadata {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Chunk file has the wrong length
    #[error("corrupt chunk {path}: expected {expected} bytes, found {found}")]
    CorruptChunk {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

/// Failure of a verified write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteError {
    /// The region never read back as written
    #[error(
        "array '{array}' inconsistent after {attempts} write attempts: {}",
        diagnostics.join("; ")
    )]
    Inconsistent {
        array: String,
        attempts: usize,
        diagnostics: Vec<String>,
    },
}
