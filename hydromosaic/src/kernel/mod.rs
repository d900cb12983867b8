//! Per-tile terrain computations.
//!
//! The pipeline only sees the [`TerrainKernel`] trait. [`D8Kernel`] is the
//! bundled implementation: priority-flood conditioning, steepest-descent
//! (D8) slope and aspect, and D8 upstream-area accumulation with boundary
//! bookkeeping.
//!
//! # Boundary bookkeeping
//!
//! Upstream area is first computed per tile in isolation. Two boolean
//! layers then describe how the tile's boundary relates to its neighbors:
//!
//! - **todo**: non-corner boundary cells that drain into the tile, whose
//!   area may still grow from flow entering across the tile edge
//! - **done**: boundary cells with no pending todo cell upstream of them
//!   inside the tile, so their value can be handed to a neighbor
//!
//! A boundary cell is shared with the neighbor across the edge. Whichever
//! side drains it more steeply owns it and waits for the other side's
//! value; on a tie neither side waits. A correction pass takes the
//! neighbor values and flags at the edge reference locations, folds
//! resolvable inflow into the tile and returns the updated layers.

mod d8;

pub use d8::{D8Kernel, FLAT_EPSILON, NO_FLOW};

use crate::grid::Direction;
use crate::raster::Grid;
use thiserror::Error;

/// Errors returned by kernel computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Two input layers disagree in shape
    #[error("{layer} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        layer: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Edge input length does not match the tile edge
    #[error("{direction} edge input has {found} cells, expected {expected}")]
    EdgeLength {
        direction: Direction,
        expected: usize,
        found: usize,
    },

    /// Tile holds no valid elevation
    #[error("tile has no valid elevation values")]
    NoData,

    /// Any other numeric failure
    #[error("{0}")]
    Numeric(String),
}

/// Slope magnitude and flow direction of a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeAspect {
    pub slope: Grid<f32>,
    /// Flow direction in radians counter-clockwise from east, or
    /// [`NO_FLOW`]
    pub aspect: Grid<f32>,
}

/// Upstream area of a tile plus its boundary flags.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamArea {
    pub uca: Grid<f32>,
    pub todo: Grid<bool>,
    pub done: Grid<bool>,
}

impl UpstreamArea {
    /// Number of todo cells.
    pub fn pending(&self) -> usize {
        self.todo.as_slice().iter().filter(|v| **v).count()
    }
}

/// Boundary data seen across one tile edge.
///
/// All vectors run along the edge: top to bottom for left/right edges,
/// left to right for top/bottom edges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeInput {
    /// Neighbor upstream area at the reference location
    pub neighbor_values: Vec<f32>,
    /// Neighbor done flags at the reference location
    pub neighbor_done: Vec<bool>,
    /// This tile's todo flags on the edge, already cleared where the
    /// neighbor owns the shared cell
    pub todo: Vec<bool>,
}

/// Edge inputs for all four directions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeInputs {
    edges: [EdgeInput; 4],
}

impl EdgeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, direction: Direction, input: EdgeInput) {
        self.edges[direction.index()] = input;
    }

    pub fn get(&self, direction: Direction) -> &EdgeInput {
        &self.edges[direction.index()]
    }
}

/// Numeric collaborator computing the per-tile products.
///
/// Implementations must be shareable between worker threads. Every method
/// works on a single tile in isolation; boundary exchange happens only
/// through [`EdgeInputs`].
pub trait TerrainKernel: Send + Sync {
    /// Condition raw elevation so every cell drains to the tile boundary.
    fn condition_elevation(&self, elevation: &Grid<f32>) -> Result<Grid<f32>, KernelError>;

    /// Slope and flow direction from conditioned elevation.
    fn slope_aspect(&self, elevation: &Grid<f32>) -> Result<SlopeAspect, KernelError>;

    /// Tile-local upstream area with initial boundary flags.
    fn upstream_area(
        &self,
        elevation: &Grid<f32>,
        aspect: &Grid<f32>,
    ) -> Result<UpstreamArea, KernelError>;

    /// Fold neighbor boundary data into a previously computed upstream area.
    fn correct_upstream_area(
        &self,
        elevation: &Grid<f32>,
        aspect: &Grid<f32>,
        current: &UpstreamArea,
        edges: &EdgeInputs,
    ) -> Result<UpstreamArea, KernelError>;
}
