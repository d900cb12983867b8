//! Stage execution: worker pool, per-tile tasks and success tracking.

mod outcome;
mod pool;
mod runner;
mod success;
mod task;
mod worker;

pub use outcome::TaskOutcome;
pub use pool::{Completion, Handler, WorkerPool};
pub use runner::{StageReport, StageRunner, TaskFn};
pub use success::{Stage, SuccessTable};
pub use task::StageTask;
pub use worker::TileWorker;
