//! Runs one stage across every unfinished tile.

use super::outcome::TaskOutcome;
use super::pool::{Handler, WorkerPool};
use super::task::StageTask;
use crate::log::Logger;
use crate::{log_debug, log_info, log_warn};
use std::io;
use std::sync::Arc;

/// Per-tile task function shared by the pool.
pub type TaskFn = Arc<dyn Fn(&StageTask) -> TaskOutcome + Send + Sync>;

/// Result of one stage run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// Updated success flag for every tile
    pub success: Vec<bool>,
    /// Outcome of every task that ran, in completion order
    pub outcomes: Vec<(usize, TaskOutcome)>,
}

impl StageReport {
    /// Number of task invocations.
    pub fn invocations(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of failed tasks.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| !o.success).count()
    }
}

/// Bounded stage executor.
///
/// Every tile whose prior success flag is false gets exactly one task
/// invocation. Failures and panics never abort the batch and are never
/// retried here.
pub struct StageRunner {
    workers: usize,
    logger: Arc<dyn Logger>,
}

impl StageRunner {
    pub fn new(workers: usize, logger: Arc<dyn Logger>) -> Self {
        Self {
            workers: workers.max(1),
            logger,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `tasks` (one per tile) skipping tiles already successful in
    /// `prior`.
    pub fn run(
        &self,
        tasks: Vec<StageTask>,
        prior: &[bool],
        execute: TaskFn,
    ) -> io::Result<StageReport> {
        self.run_with(tasks, prior, execute, || ()).map(|(report, _)| report)
    }

    /// Like [`run`](Self::run), running `intermediate` on the driver
    /// thread once every task has been submitted.
    pub fn run_with<T>(
        &self,
        tasks: Vec<StageTask>,
        prior: &[bool],
        execute: TaskFn,
        intermediate: impl FnOnce() -> T,
    ) -> io::Result<(StageReport, T)> {
        let mut success: Vec<bool> = (0..tasks.len())
            .map(|i| prior.get(i).copied().unwrap_or(false))
            .collect();

        let handler: Handler<StageTask, TaskOutcome> = {
            let execute = Arc::clone(&execute);
            Arc::new(move |task: StageTask| execute(&task))
        };
        let mut pool = WorkerPool::new("stage-worker", self.workers, handler)?;

        let mut paths = Vec::with_capacity(tasks.len());
        for task in tasks {
            paths.push(task.path().display().to_string());
            let tile = task.tile();
            if success[tile] {
                continue;
            }
            if !pool.submit(tile, task) {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    format!("stage workers stopped before tile {} was submitted", tile),
                ));
            }
        }

        log_info!(
            self.logger,
            "Submitted {} tasks, waiting for computation",
            pool.in_flight()
        );
        let extra = intermediate();

        let mut outcomes = Vec::with_capacity(pool.in_flight());
        while let Some(completion) = pool.recv() {
            let outcome = match completion.result {
                Ok(outcome) => outcome,
                Err(payload) => TaskOutcome::from_panic(&paths[completion.id], payload.as_ref()),
            };
            if outcome.success {
                log_debug!(self.logger, "{}", outcome);
            } else {
                log_warn!(self.logger, "{}", outcome);
            }
            success[completion.id] = outcome.success;
            outcomes.push((completion.id, outcome));
        }

        Ok((StageReport { success, outcomes }, extra))
    }
}
