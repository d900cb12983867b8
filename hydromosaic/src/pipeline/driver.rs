//! The pipeline driver.

use super::error::PipelineError;
use super::options::PipelineOptions;
use crate::edge::{ConvergenceReport, EdgeContext, EdgeScheduler};
use crate::grid::{GlobalGrid, OverlapGeometry};
use crate::index::TileIndex;
use crate::kernel::{D8Kernel, TerrainKernel};
use crate::log::Logger;
use crate::raster::RasterSource;
use crate::stage::{Stage, StageReport, StageRunner, StageTask, SuccessTable, TaskFn, TileWorker};
use crate::store::{names, ChunkedStore};
use crate::{log_debug, log_info, log_warn};
use std::fmt;
use std::sync::Arc;

/// Outcome of [`Pipeline::process_all`].
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub n_tiles: usize,
    pub mosaic_shape: (usize, usize),
    /// Successful tiles per stage, in [`Stage::ALL`] order
    pub succeeded: [usize; 4],
    /// Boundary correction invocations
    pub corrections: usize,
    /// Boundary cells still waiting on a neighbor
    pub pending: usize,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} tiles, mosaic {} x {}",
            self.n_tiles, self.mosaic_shape.0, self.mosaic_shape.1
        )?;
        for stage in Stage::ALL {
            writeln!(
                f,
                "  {:<12} {}/{}",
                stage.name(),
                self.succeeded[stage.column()],
                self.n_tiles
            )?;
        }
        write!(
            f,
            "  {} edge corrections, {} boundary cells pending",
            self.corrections, self.pending
        )
    }
}

/// Explicit run context owned by the driving thread.
///
/// Holds the tile index, the assembled grid and overlap geometry, the store
/// handle and the success table. Workers only ever see the store and their
/// own [`StageTask`].
pub struct Pipeline {
    index: TileIndex,
    source: Arc<dyn RasterSource>,
    store: Arc<dyn ChunkedStore>,
    kernel: Arc<dyn TerrainKernel>,
    logger: Arc<dyn Logger>,
    options: PipelineOptions,
    grid: Option<GlobalGrid>,
    overlaps: Option<OverlapGeometry>,
    success: SuccessTable,
}

impl Pipeline {
    /// Create a pipeline using the bundled [`D8Kernel`].
    pub fn new(
        index: TileIndex,
        source: Arc<dyn RasterSource>,
        store: Arc<dyn ChunkedStore>,
        logger: Arc<dyn Logger>,
        options: PipelineOptions,
    ) -> Self {
        let n_tiles = index.len();
        Self {
            index,
            source,
            store,
            kernel: Arc::new(D8Kernel::new()),
            logger,
            options,
            grid: None,
            overlaps: None,
            success: SuccessTable::new(n_tiles),
        }
    }

    /// Replace the terrain kernel.
    pub fn with_kernel(mut self, kernel: Arc<dyn TerrainKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    pub fn grid(&self) -> Option<&GlobalGrid> {
        self.grid.as_ref()
    }

    pub fn overlaps(&self) -> Option<&OverlapGeometry> {
        self.overlaps.as_ref()
    }

    pub fn success(&self) -> &SuccessTable {
        &self.success
    }

    pub fn store(&self) -> &Arc<dyn ChunkedStore> {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every stage in order.
    pub fn process_all(&mut self) -> Result<PipelineSummary, PipelineError> {
        self.compute_grid()?;
        self.process_elevation()?;
        self.process_aspect_slope()?;
        self.process_uca()?;
        let edges = self.process_uca_edges()?;

        let (n_tiles, mosaic_shape) = match &self.grid {
            Some(grid) => (grid.n_tiles(), grid.mosaic_shape()),
            None => (0, (0, 0)),
        };
        Ok(PipelineSummary {
            n_tiles,
            mosaic_shape,
            succeeded: Stage::ALL.map(|stage| self.success.count(stage)),
            corrections: edges.invocations(),
            pending: edges.metrics.total_pending(),
        })
    }

    /// Assemble the global grid, open every array and load the success
    /// table left by an earlier run.
    pub fn compute_grid(&mut self) -> Result<&GlobalGrid, PipelineError> {
        let grid = self.assemble()?;
        Ok(self.grid.insert(grid))
    }

    pub fn process_elevation(&mut self) -> Result<StageReport, PipelineError> {
        log_info!(self.logger, "Compute Elevation");
        self.run_stage(Stage::Elevation)
    }

    pub fn process_aspect_slope(&mut self) -> Result<StageReport, PipelineError> {
        log_info!(self.logger, "Compute Aspect and Slope");
        self.run_stage(Stage::SlopeAspect)
    }

    /// Tile-local upstream area. Overlap geometry is resolved while the
    /// tasks run.
    pub fn process_uca(&mut self) -> Result<StageReport, PipelineError> {
        log_info!(self.logger, "Compute UCA");
        let grid = self.take_grid()?;
        let result = self.run_uca(&grid);
        self.grid = Some(grid);
        result
    }

    /// Drive boundary corrections until no tile can make progress.
    pub fn process_uca_edges(&mut self) -> Result<ConvergenceReport, PipelineError> {
        log_info!(self.logger, "Compute UCA Corrections");
        let grid = self.take_grid()?;
        let result = self.run_edges(&grid);
        self.grid = Some(grid);
        result
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn assemble(&mut self) -> Result<GlobalGrid, PipelineError> {
        log_info!(self.logger, "Compute Grid");
        let grid = GlobalGrid::assemble(&self.index, self.options.round_decimals)?;

        for spec in names::pipeline_arrays(
            grid.mosaic_shape(),
            grid.chunk_shape(),
            grid.n_tiles(),
            Stage::ALL.len(),
        ) {
            self.store.open(&spec)?;
        }
        self.success = SuccessTable::load(self.store.as_ref(), grid.n_tiles())?;

        let (rows, cols) = grid.shape();
        log_info!(
            self.logger,
            "{} tiles in a {} x {} grid, mosaic {:?}, chunks {:?}",
            grid.n_tiles(),
            rows,
            cols,
            grid.mosaic_shape(),
            grid.chunk_shape()
        );
        log_debug!(self.logger, "Tile layout:\n{}", grid);
        for stage in Stage::ALL {
            let done = self.success.count(stage);
            if done > 0 {
                log_info!(
                    self.logger,
                    "Resuming: {} of {} tiles already finished {}",
                    done,
                    grid.n_tiles(),
                    stage
                );
            }
        }
        Ok(grid)
    }

    /// The assembled grid, assembling it first if needed.
    fn take_grid(&mut self) -> Result<GlobalGrid, PipelineError> {
        match self.grid.take() {
            Some(grid) => Ok(grid),
            None => self.assemble(),
        }
    }

    fn run_stage(&mut self, stage: Stage) -> Result<StageReport, PipelineError> {
        let grid = self.take_grid()?;
        let result = self.run_simple_stage(&grid, stage);
        self.grid = Some(grid);
        result
    }

    fn run_simple_stage(
        &mut self,
        grid: &GlobalGrid,
        stage: Stage,
    ) -> Result<StageReport, PipelineError> {
        let tasks = StageTask::for_all(stage, &self.index, grid, None);
        let prior = self.success.column(stage);
        let report = self.runner().run(tasks, &prior, self.task_fn())?;
        self.record(stage, &report)?;
        Ok(report)
    }

    fn run_uca(&mut self, grid: &GlobalGrid) -> Result<StageReport, PipelineError> {
        let tasks = StageTask::for_all(Stage::Uca, &self.index, grid, None);
        let prior = self.success.column(Stage::Uca);
        let index = &self.index;
        let (report, overlaps) = self.runner().run_with(tasks, &prior, self.task_fn(), || {
            OverlapGeometry::compute(index, grid)
        })?;
        self.record(Stage::Uca, &report)?;

        let overlaps = overlaps?;
        log_debug!(
            self.logger,
            "Overlap-free mosaic would be {:?}",
            overlaps.noverlap_shape()
        );
        self.overlaps = Some(overlaps);
        Ok(report)
    }

    fn run_edges(&mut self, grid: &GlobalGrid) -> Result<ConvergenceReport, PipelineError> {
        let overlaps = match self.overlaps.take() {
            Some(overlaps) => overlaps,
            None => OverlapGeometry::compute(&self.index, grid)?,
        };
        let result = self.converge(grid, &overlaps);
        self.overlaps = Some(overlaps);
        result
    }

    fn converge(
        &mut self,
        grid: &GlobalGrid,
        overlaps: &OverlapGeometry,
    ) -> Result<ConvergenceReport, PipelineError> {
        let tasks = StageTask::for_all(Stage::UcaEdge, &self.index, grid, Some(overlaps));
        let scheduler = EdgeScheduler::new(
            self.options.workers,
            self.options.poll_interval,
            Arc::clone(&self.logger),
        );
        let ctx = EdgeContext {
            store: self.store.as_ref(),
            grid,
            overlaps,
        };
        let report = scheduler.run(ctx, &tasks, self.task_fn())?;

        for (tile, latest) in report.latest.iter().enumerate() {
            if let Some(success) = latest {
                self.success.set(tile, Stage::UcaEdge, *success);
            }
        }
        self.success.save(self.store.as_ref())?;
        let failed = report.failed_tiles();
        if !failed.is_empty() {
            log_warn!(
                self.logger,
                "{} tiles failed their last correction: {:?}",
                failed.len(),
                failed
            );
        }
        Ok(report)
    }

    fn record(&mut self, stage: Stage, report: &StageReport) -> Result<(), PipelineError> {
        self.success.set_column(stage, &report.success);
        self.success.save(self.store.as_ref())?;
        log_info!(
            self.logger,
            "{}: {} of {} tiles succeeded ({} ran, {} failed)",
            stage,
            self.success.count(stage),
            self.success.len(),
            report.invocations(),
            report.failures()
        );
        Ok(())
    }

    fn runner(&self) -> StageRunner {
        StageRunner::new(self.options.workers, Arc::clone(&self.logger))
    }

    fn task_fn(&self) -> TaskFn {
        let worker = TileWorker::new(
            Arc::clone(&self.store),
            Arc::clone(&self.source),
            Arc::clone(&self.kernel),
        )
        .with_logger(Arc::clone(&self.logger));
        Arc::new(move |task: &StageTask| worker.execute(task))
    }
}
