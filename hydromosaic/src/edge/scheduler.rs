//! Priority-driven boundary correction loop.

use super::metric::{MetricTable, RankEntry};
use super::EdgeError;
use crate::grid::{GlobalGrid, OverlapGeometry};
use crate::log::Logger;
use crate::stage::{Completion, Handler, StageTask, TaskFn, TaskOutcome, WorkerPool};
use crate::store::ChunkedStore;
use crate::{log_debug, log_info, log_warn};
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a single wait for a completion.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What the grid looks like to the scheduler.
#[derive(Clone, Copy)]
pub struct EdgeContext<'a> {
    pub store: &'a dyn ChunkedStore,
    pub grid: &'a GlobalGrid,
    pub overlaps: &'a OverlapGeometry,
}

/// Final state of a convergence run.
#[derive(Debug, Clone)]
pub struct ConvergenceReport {
    /// Metrics of every tile after the last correction
    pub metrics: MetricTable,
    /// Every correction outcome in completion order
    pub outcomes: Vec<(usize, TaskOutcome)>,
    /// Latest outcome per tile, `None` when the tile never ran
    pub latest: Vec<Option<bool>>,
}

impl ConvergenceReport {
    pub fn invocations(&self) -> usize {
        self.outcomes.len()
    }

    pub fn invocations_of(&self, tile: usize) -> usize {
        self.outcomes.iter().filter(|(t, _)| *t == tile).count()
    }

    /// Tiles whose latest correction failed.
    pub fn failed_tiles(&self) -> Vec<usize> {
        (0..self.latest.len())
            .filter(|&t| self.latest[t] == Some(false))
            .collect()
    }
}

/// Repeatedly corrects the tiles most likely to make progress until no
/// tile has resolvable pending work.
///
/// Failed corrections are logged and recorded; the tile stays in the
/// ranking for as long as its metric is positive.
pub struct EdgeScheduler {
    workers: usize,
    poll_interval: Duration,
    logger: Arc<dyn Logger>,
}

impl EdgeScheduler {
    pub fn new(workers: usize, poll_interval: Duration, logger: Arc<dyn Logger>) -> Self {
        Self {
            workers: workers.max(1),
            poll_interval,
            logger,
        }
    }

    /// Maximum number of corrections in flight.
    pub fn active_cap(&self) -> usize {
        2 * self.workers
    }

    /// Drive corrections to convergence.
    ///
    /// `tasks` holds one [`StageTask::UcaEdge`] per tile in tile order.
    /// One worker runs the serial loop on the calling thread.
    pub fn run(
        &self,
        ctx: EdgeContext<'_>,
        tasks: &[StageTask],
        execute: TaskFn,
    ) -> Result<ConvergenceReport, EdgeError> {
        let mut metrics = MetricTable::compute(ctx.store, ctx.grid, ctx.overlaps)?;
        let mut history = History::new(ctx.grid.n_tiles());

        if self.workers == 1 {
            self.run_serial(ctx, tasks, &execute, &mut metrics, &mut history)?;
        } else {
            self.run_parallel(ctx, tasks, &execute, &mut metrics, &mut history)?;
        }

        let metrics = MetricTable::compute(ctx.store, ctx.grid, ctx.overlaps)?;
        metrics.save(ctx.store)?;
        log_info!(
            self.logger,
            "Edge corrections finished after {} invocations, {} boundary cells still pending",
            history.outcomes.len(),
            metrics.total_pending()
        );

        Ok(ConvergenceReport {
            metrics,
            outcomes: history.outcomes,
            latest: history.latest,
        })
    }

    fn run_serial(
        &self,
        ctx: EdgeContext<'_>,
        tasks: &[StageTask],
        execute: &TaskFn,
        metrics: &mut MetricTable,
        history: &mut History,
    ) -> Result<(), EdgeError> {
        let mut ranking = metrics.eligible(|_| false);
        let mut first = true;
        loop {
            let tile = match (ranking.first(), first) {
                (Some(entry), _) => entry.tile,
                // Always correct at least once
                (None, true) => match metrics.ranking().first() {
                    Some(entry) => entry.tile,
                    None => return Ok(()),
                },
                (None, false) => return Ok(()),
            };

            let task = &tasks[tile];
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(task)))
                .unwrap_or_else(|payload| {
                    TaskOutcome::from_panic(&task.path().display().to_string(), payload.as_ref())
                });
            history.record(tile, outcome, self.logger.as_ref());

            let mut touched = ctx.grid.neighbors(tile);
            touched.push(tile);
            metrics.refresh(ctx.store, ctx.grid, ctx.overlaps, &touched)?;

            let next = metrics.eligible(|_| false);
            log_debug!(self.logger, "Corrected tile {}, next {:?}", tile, tiles_of(&next));
            if next == ranking {
                return Ok(());
            }
            ranking = next;
            first = false;
        }
    }

    fn run_parallel(
        &self,
        ctx: EdgeContext<'_>,
        tasks: &[StageTask],
        execute: &TaskFn,
        metrics: &mut MetricTable,
        history: &mut History,
    ) -> Result<(), EdgeError> {
        let handler: Handler<StageTask, TaskOutcome> = {
            let execute = Arc::clone(execute);
            Arc::new(move |task: StageTask| execute(&task))
        };
        let mut pool = WorkerPool::new("uca-edge", self.workers, handler)?;
        let cap = self.active_cap();
        let mut active: BTreeSet<usize> = BTreeSet::new();

        let mut initial = metrics.eligible(|_| false);
        if initial.is_empty() {
            initial = metrics.ranking().into_iter().take(1).collect();
        }
        for entry in initial.iter().take(cap) {
            launch(&mut pool, &mut active, tasks, entry.tile)?;
        }
        log_info!(self.logger, "Starting with {:?}", active);

        while !active.is_empty() {
            let first = match pool.recv_timeout(self.poll_interval) {
                Some(completion) => completion,
                None => continue,
            };
            let mut finished = vec![first];
            while let Some(completion) = pool.try_recv() {
                finished.push(completion);
            }

            let mut touched = Vec::new();
            let n_finished = finished.len();
            for completion in finished {
                let tile = completion.id;
                active.remove(&tile);
                let outcome = into_outcome(completion, tasks);
                history.record(tile, outcome, self.logger.as_ref());
                touched.push(tile);
                touched.extend(ctx.grid.neighbors(tile));
            }
            touched.sort_unstable();
            touched.dedup();
            metrics.refresh(ctx.store, ctx.grid, ctx.overlaps, &touched)?;

            let slots = n_finished.min(cap.saturating_sub(active.len()));
            let candidates: Vec<RankEntry> = metrics
                .eligible(|t| active.contains(&t))
                .into_iter()
                .take(slots)
                .collect();
            for entry in &candidates {
                launch(&mut pool, &mut active, tasks, entry.tile)?;
            }
            log_debug!(
                self.logger,
                "Added {:?}, active {:?}",
                tiles_of(&candidates),
                active
            );
        }
        Ok(())
    }
}

/// Submit the correction of `tile` and mark it active.
fn launch(
    pool: &mut WorkerPool<StageTask, TaskOutcome>,
    active: &mut BTreeSet<usize>,
    tasks: &[StageTask],
    tile: usize,
) -> Result<(), EdgeError> {
    if !pool.submit(tile, tasks[tile].clone()) {
        return Err(EdgeError::WorkersStopped(tile));
    }
    active.insert(tile);
    Ok(())
}

/// Outcomes collected by the driver.
struct History {
    latest: Vec<Option<bool>>,
    outcomes: Vec<(usize, TaskOutcome)>,
}

impl History {
    fn new(n_tiles: usize) -> Self {
        Self {
            latest: vec![None; n_tiles],
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, tile: usize, outcome: TaskOutcome, logger: &dyn Logger) {
        if outcome.success {
            log_debug!(logger, "{}", outcome);
        } else {
            log_warn!(logger, "{}", outcome);
        }
        self.latest[tile] = Some(outcome.success);
        self.outcomes.push((tile, outcome));
    }
}

fn into_outcome(completion: Completion<TaskOutcome>, tasks: &[StageTask]) -> TaskOutcome {
    match completion.result {
        Ok(outcome) => outcome,
        Err(payload) => TaskOutcome::from_panic(
            &tasks[completion.id].path().display().to_string(),
            payload.as_ref(),
        ),
    }
}

fn tiles_of(entries: &[RankEntry]) -> Vec<usize> {
    entries.iter().map(|e| e.tile).collect()
}
