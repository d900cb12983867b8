//! Stage execution for a single tile.

use super::outcome::TaskOutcome;
use super::task::StageTask;
use crate::grid::{Direction, Region};
use crate::kernel::{EdgeInput, EdgeInputs, KernelError, TerrainKernel, UpstreamArea};
use crate::log::{Logger, NoOpLogger};
use crate::raster::{Grid, RasterError, RasterSource};
use crate::store::{names, write_verified, Block, ChunkedStore, StoreError, WriteError};
use std::sync::Arc;
use thiserror::Error;

/// Anything that can make a single task fail.
#[derive(Debug, Error)]
enum TaskError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("array '{0}' holds the wrong element type")]
    WrongType(&'static str),

    #[error("raster has shape {found:?} but its grid slice is {expected:?}")]
    RasterShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Runs stage tasks against the shared store.
///
/// Cheap to clone; all workers of a pool share one instance.
#[derive(Clone)]
pub struct TileWorker {
    store: Arc<dyn ChunkedStore>,
    source: Arc<dyn RasterSource>,
    kernel: Arc<dyn TerrainKernel>,
    logger: Arc<dyn Logger>,
}

impl TileWorker {
    pub fn new(
        store: Arc<dyn ChunkedStore>,
        source: Arc<dyn RasterSource>,
        kernel: Arc<dyn TerrainKernel>,
    ) -> Self {
        Self {
            store,
            source,
            kernel,
            logger: Arc::new(NoOpLogger),
        }
    }

    /// Report write retries through `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Execute a task, converting every error into a failed outcome.
    pub fn execute(&self, task: &StageTask) -> TaskOutcome {
        let result = match task {
            StageTask::Elevation { path, slice, .. } => self.elevation(path, slice),
            StageTask::SlopeAspect { slice, .. } => self.slope_aspect(slice),
            StageTask::Uca { slice, .. } => self.upstream_area(slice),
            StageTask::UcaEdge {
                slice, references, ..
            } => self.correct_edges(slice, references),
        };

        let name = task.path().display();
        match result {
            Ok(()) => TaskOutcome::succeeded(format!("{}: success", name)),
            Err(e) => TaskOutcome::failed(format!("{}: {}", name, e)),
        }
    }

    fn elevation(&self, path: &std::path::Path, slice: &Region) -> Result<(), TaskError> {
        let raw = self.source.read_elevation(path)?;
        if raw.shape() != slice.shape() {
            return Err(TaskError::RasterShape {
                expected: slice.shape(),
                found: raw.shape(),
            });
        }
        let elev = self.kernel.condition_elevation(&raw)?;
        self.save(names::ELEV, slice, Block::F32(elev))
    }

    fn slope_aspect(&self, slice: &Region) -> Result<(), TaskError> {
        let elev = self.read_f32(names::ELEV, slice)?;
        let result = self.kernel.slope_aspect(&elev)?;
        self.save(names::ASPECT, slice, Block::F32(result.aspect))?;
        self.save(names::SLOPE, slice, Block::F32(result.slope))
    }

    fn upstream_area(&self, slice: &Region) -> Result<(), TaskError> {
        let elev = self.read_f32(names::ELEV, slice)?;
        let aspect = self.read_f32(names::ASPECT, slice)?;
        let area = self.kernel.upstream_area(&elev, &aspect)?;
        self.save_area(slice, area)
    }

    fn correct_edges(&self, slice: &Region, references: &[Region; 4]) -> Result<(), TaskError> {
        let elev = self.read_f32(names::ELEV, slice)?;
        let aspect = self.read_f32(names::ASPECT, slice)?;
        let current = UpstreamArea {
            uca: self.read_f32(names::UCA, slice)?,
            todo: self.read_bool(names::EDGE_TODO, slice)?,
            done: self.read_bool(names::EDGE_DONE, slice)?,
        };

        let slope = self.read_f32(names::SLOPE, slice)?;

        let mut edges = EdgeInputs::new();
        for dir in Direction::ALL {
            let reference = &references[dir.index()];
            let neighbor_slope = self.read_f32(names::SLOPE, reference)?.into_vec();
            let todo = edge_values(&current.todo, dir)
                .into_iter()
                .zip(edge_values(&slope, dir))
                .zip(&neighbor_slope)
                .map(|((waiting, mine), theirs)| waiting && owns_shared_cell(mine, *theirs))
                .collect();

            edges.set(
                dir,
                EdgeInput {
                    neighbor_values: self.read_f32(names::UCA, reference)?.into_vec(),
                    neighbor_done: self.read_bool(names::EDGE_DONE, reference)?.into_vec(),
                    todo,
                },
            );
        }

        let area = self
            .kernel
            .correct_upstream_area(&elev, &aspect, &current, &edges)?;
        self.save_area(slice, area)
    }

    fn save_area(&self, slice: &Region, area: UpstreamArea) -> Result<(), TaskError> {
        self.save(names::UCA, slice, Block::F32(area.uca))?;
        self.save(names::EDGE_TODO, slice, Block::Bool(area.todo))?;
        self.save(names::EDGE_DONE, slice, Block::Bool(area.done))
    }

    fn save(&self, name: &str, slice: &Region, block: Block) -> Result<(), TaskError> {
        write_verified(self.store.as_ref(), self.logger.as_ref(), name, slice, &block)?;
        Ok(())
    }

    fn read_f32(&self, name: &'static str, region: &Region) -> Result<Grid<f32>, TaskError> {
        self.store
            .read(name, region)?
            .into_f32()
            .ok_or(TaskError::WrongType(name))
    }

    fn read_bool(&self, name: &'static str, region: &Region) -> Result<Grid<bool>, TaskError> {
        self.store
            .read(name, region)?
            .into_bool()
            .ok_or(TaskError::WrongType(name))
    }
}

/// Whether this side keeps waiting on a cell it shares with a neighbor.
///
/// The side that drains the cell more steeply owns it. When both sides
/// are waiting on the cell, only the owner keeps its todo; on a tie or a
/// nodata neighbor neither side waits.
fn owns_shared_cell(own_slope: f32, neighbor_slope: f32) -> bool {
    neighbor_slope < own_slope
}

/// Values along one edge of a tile-shaped grid.
fn edge_values<T: Copy>(grid: &Grid<T>, dir: Direction) -> Vec<T> {
    match dir {
        Direction::Left => grid.column(0),
        Direction::Right => grid.column(grid.cols() - 1),
        Direction::Top => grid.row(0),
        Direction::Bottom => grid.row(grid.rows() - 1),
    }
}
