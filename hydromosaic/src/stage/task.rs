//! Per-tile argument bundles for each stage.

use super::success::Stage;
use crate::grid::{Direction, GlobalGrid, OverlapGeometry, Region};
use crate::index::TileIndex;
use std::path::{Path, PathBuf};

/// Everything a worker needs to run one stage on one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum StageTask {
    /// Read raw elevation and condition it
    Elevation {
        tile: usize,
        path: PathBuf,
        slice: Region,
    },
    /// Derive slope and aspect from conditioned elevation
    SlopeAspect {
        tile: usize,
        path: PathBuf,
        slice: Region,
    },
    /// Tile-local upstream area and initial boundary flags
    Uca {
        tile: usize,
        path: PathBuf,
        slice: Region,
    },
    /// One boundary-correction pass
    UcaEdge {
        tile: usize,
        path: PathBuf,
        slice: Region,
        /// Edge reference locations in [`Direction::ALL`] order
        references: [Region; 4],
    },
}

impl StageTask {
    /// Build the task of `stage` for one tile.
    pub fn new(
        stage: Stage,
        tile: usize,
        index: &TileIndex,
        grid: &GlobalGrid,
        overlaps: Option<&OverlapGeometry>,
    ) -> Self {
        let path = index[tile].path.clone();
        let slice = grid.slice(tile).clone();
        match (stage, overlaps) {
            (Stage::Elevation, _) => StageTask::Elevation { tile, path, slice },
            (Stage::SlopeAspect, _) => StageTask::SlopeAspect { tile, path, slice },
            (Stage::Uca, _) => StageTask::Uca { tile, path, slice },
            (Stage::UcaEdge, Some(overlaps)) => StageTask::UcaEdge {
                tile,
                path,
                references: Direction::ALL.map(|dir| overlaps.reference(tile, dir).clone()),
                slice,
            },
            // Without overlap geometry every edge references the tile itself
            (Stage::UcaEdge, None) => StageTask::UcaEdge {
                tile,
                path,
                references: Direction::ALL.map(|dir| slice.edge(dir)),
                slice,
            },
        }
    }

    /// Tasks of `stage` for every tile of the grid.
    pub fn for_all(
        stage: Stage,
        index: &TileIndex,
        grid: &GlobalGrid,
        overlaps: Option<&OverlapGeometry>,
    ) -> Vec<Self> {
        (0..grid.n_tiles())
            .map(|tile| Self::new(stage, tile, index, grid, overlaps))
            .collect()
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageTask::Elevation { .. } => Stage::Elevation,
            StageTask::SlopeAspect { .. } => Stage::SlopeAspect,
            StageTask::Uca { .. } => Stage::Uca,
            StageTask::UcaEdge { .. } => Stage::UcaEdge,
        }
    }

    pub fn tile(&self) -> usize {
        match self {
            StageTask::Elevation { tile, .. }
            | StageTask::SlopeAspect { tile, .. }
            | StageTask::Uca { tile, .. }
            | StageTask::UcaEdge { tile, .. } => *tile,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StageTask::Elevation { path, .. }
            | StageTask::SlopeAspect { path, .. }
            | StageTask::Uca { path, .. }
            | StageTask::UcaEdge { path, .. } => path,
        }
    }

    pub fn slice(&self) -> &Region {
        match self {
            StageTask::Elevation { slice, .. }
            | StageTask::SlopeAspect { slice, .. }
            | StageTask::Uca { slice, .. }
            | StageTask::UcaEdge { slice, .. } => slice,
        }
    }
}
