//! Edge convergence: iterative boundary correction across tiles.
//!
//! After the initial upstream-area stage every tile knows which of its
//! boundary cells still wait on a neighbor (`edge_todo`) and which hold a
//! final value (`edge_done`). The [`EdgeScheduler`] keeps re-running the
//! correction stage on the tiles whose [`EdgeMetric`] says they can make
//! progress, until none can.

mod metric;
mod scheduler;

pub use metric::{compute_metric, EdgeMetric, MetricTable, RankEntry};
pub use scheduler::{ConvergenceReport, EdgeContext, EdgeScheduler, DEFAULT_POLL_INTERVAL};

use crate::store::StoreError;
use std::io;
use thiserror::Error;

/// Errors that stop the convergence loop.
///
/// Failed corrections are not errors; they are recorded in the report.
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("failed to read edge state: {0}")]
    Store(#[from] StoreError),

    #[error("failed to start correction workers: {0}")]
    Pool(#[from] io::Error),

    #[error("correction workers stopped before tile {0} could be submitted")]
    WorkersStopped(usize),
}
