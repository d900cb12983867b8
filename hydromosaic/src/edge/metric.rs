//! Per-tile boundary convergence metric.

use crate::grid::{Direction, GlobalGrid, OverlapGeometry, Region};
use crate::raster::Grid;
use crate::store::{names, Block, ChunkedStore, DType, StoreError};

/// Keeps the fraction finite for tiles with nothing pending.
const PENDING_EPSILON: f64 = 1e-16;

/// How close one tile's boundary is to being resolvable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMetric {
    /// `resolvable / pending`, in `[0, 1]`
    pub fraction: f64,
    /// Own todo cells whose neighbor value is already done
    pub resolvable: usize,
    /// Own todo cells over all four edges
    pub pending: usize,
}

impl EdgeMetric {
    pub fn new(resolvable: usize, pending: usize) -> Self {
        Self {
            fraction: resolvable as f64 / (PENDING_EPSILON + pending as f64),
            resolvable,
            pending,
        }
    }

    /// Whether correcting the tile now can make progress.
    pub fn is_positive(&self) -> bool {
        self.fraction > 0.0
    }
}

/// Compute the metric of one tile from the stored edge layers.
///
/// Own todo flags are taken from the tile's outermost rows/columns, done
/// flags from the matching edge reference locations.
pub fn compute_metric(
    store: &dyn ChunkedStore,
    grid: &GlobalGrid,
    overlaps: &OverlapGeometry,
    tile: usize,
) -> Result<EdgeMetric, StoreError> {
    let slice = grid.slice(tile);
    let mut pending = 0;
    let mut resolvable = 0;
    for dir in Direction::ALL {
        let todo = read_bool(store, names::EDGE_TODO, &slice.edge(dir))?;
        let done = read_bool(store, names::EDGE_DONE, overlaps.reference(tile, dir))?;
        for (t, d) in todo.as_slice().iter().zip(done.as_slice()) {
            if *t {
                pending += 1;
                if *d {
                    resolvable += 1;
                }
            }
        }
    }
    Ok(EdgeMetric::new(resolvable, pending))
}

fn read_bool(
    store: &dyn ChunkedStore,
    name: &str,
    region: &Region,
) -> Result<Grid<bool>, StoreError> {
    let block = store.read(name, region)?;
    let found = block.dtype();
    block.into_bool().ok_or_else(|| StoreError::DTypeMismatch {
        name: name.to_string(),
        expected: DType::Bool,
        found,
    })
}

/// One slot of a ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankEntry {
    pub tile: usize,
    pub fraction: f64,
    pub pending: usize,
}

/// Metrics of every tile, refreshed incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    metrics: Vec<EdgeMetric>,
}

impl MetricTable {
    /// Compute the metric of every tile.
    pub fn compute(
        store: &dyn ChunkedStore,
        grid: &GlobalGrid,
        overlaps: &OverlapGeometry,
    ) -> Result<Self, StoreError> {
        let metrics = (0..grid.n_tiles())
            .map(|tile| compute_metric(store, grid, overlaps, tile))
            .collect::<Result<_, _>>()?;
        Ok(Self { metrics })
    }

    /// Recompute the listed tiles only.
    pub fn refresh(
        &mut self,
        store: &dyn ChunkedStore,
        grid: &GlobalGrid,
        overlaps: &OverlapGeometry,
        tiles: &[usize],
    ) -> Result<(), StoreError> {
        for &tile in tiles {
            self.metrics[tile] = compute_metric(store, grid, overlaps, tile)?;
        }
        Ok(())
    }

    pub fn get(&self, tile: usize) -> EdgeMetric {
        self.metrics[tile]
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn as_slice(&self) -> &[EdgeMetric] {
        &self.metrics
    }

    /// Total pending todo cells over all tiles.
    pub fn total_pending(&self) -> usize {
        self.metrics.iter().map(|m| m.pending).sum()
    }

    /// All tiles by descending fraction, ties broken by tile index.
    pub fn ranking(&self) -> Vec<RankEntry> {
        let mut entries: Vec<RankEntry> = self
            .metrics
            .iter()
            .enumerate()
            .map(|(tile, m)| RankEntry {
                tile,
                fraction: m.fraction,
                pending: m.pending,
            })
            .collect();
        entries.sort_by(|a, b| b.fraction.total_cmp(&a.fraction).then(a.tile.cmp(&b.tile)));
        entries
    }

    /// Ranked tiles with a positive metric that `skip` does not exclude.
    pub fn eligible(&self, skip: impl Fn(usize) -> bool) -> Vec<RankEntry> {
        self.ranking()
            .into_iter()
            .filter(|e| e.fraction > 0.0 && !skip(e.tile))
            .collect()
    }

    /// Persist `(fraction, resolvable)` per tile to `uca_edge_metrics`.
    pub fn save(&self, store: &dyn ChunkedStore) -> Result<(), StoreError> {
        let grid = Grid::from_fn(self.len(), 2, |tile, col| {
            let m = self.metrics[tile];
            if col == 0 {
                m.fraction as f32
            } else {
                m.resolvable as f32
            }
        });
        store.write(
            names::UCA_EDGE_METRICS,
            &Region::full((self.len(), 2)),
            &Block::F32(grid),
        )
    }
}
