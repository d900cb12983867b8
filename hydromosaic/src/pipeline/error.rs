//! Errors that stop a pipeline run.

use crate::edge::EdgeError;
use crate::grid::GridError;
use crate::index::IndexError;
use crate::store::StoreError;
use thiserror::Error;

/// Fatal pipeline errors.
///
/// Per-tile failures never end up here; they are recorded in the success
/// table and logged.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input files could not be indexed
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Tiles do not form a consistent grid
    #[error("invalid tile grid: {0}")]
    Grid(#[from] GridError),

    /// The shared store failed outside of a task
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The edge convergence loop could not run
    #[error(transparent)]
    Edge(#[from] EdgeError),

    /// Worker threads could not be started
    #[error("failed to start workers: {0}")]
    Workers(#[from] std::io::Error),
}
