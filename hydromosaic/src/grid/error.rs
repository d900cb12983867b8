//! Grid assembly errors.
//!
//! Every variant is a fatal configuration error: the run is aborted and
//! nothing is retried.

use super::region::Direction;
use thiserror::Error;

/// Errors raised while assembling the global grid or its overlaps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// No input tiles were supplied
    #[error("no input tiles to assemble")]
    NoTiles,

    /// Two tiles round to the same grid cell
    #[error("tiles {first} and {second} both map to grid cell ({row}, {col})")]
    DuplicateCell {
        row: usize,
        col: usize,
        first: usize,
        second: usize,
    },

    /// Tiles in one grid row disagree on their row count
    #[error("tile {tile} has {found} rows but grid row {row} expects {expected}")]
    InconsistentRowSize {
        row: usize,
        tile: usize,
        expected: usize,
        found: usize,
    },

    /// Tiles in one grid column disagree on their column count
    #[error("tile {tile} has {found} columns but grid column {col} expects {expected}")]
    InconsistentColumnSize {
        col: usize,
        tile: usize,
        expected: usize,
        found: usize,
    },

    /// An edge reference location falls outside the mosaic
    #[error("{direction} edge reference of tile {tile} falls outside the mosaic")]
    ReferenceOutOfBounds { tile: usize, direction: Direction },
}
