//! Overlap resolution between neighboring tiles.
//!
//! Neighboring input files usually share a strip of pixels. For every tile
//! and direction this module splits that strip between the two tiles and
//! picks the single mosaic row or column a tile reads to receive boundary
//! data from its neighbor.

use super::assembler::{cumulative_starts, GlobalGrid};
use super::error::GridError;
use super::region::{Direction, Region};
use crate::index::{Tile, TileIndex};

/// Pixel fraction subtracted before rounding a split.
const SPLIT_TOLERANCE: f64 = 0.01;

/// Overlap widths toward one neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeOverlap {
    /// Width in the tile's own pixels
    pub own: usize,
    /// Width in the neighbor's pixels
    pub neighbor: usize,
}

impl EdgeOverlap {
    /// No neighbor in this direction.
    pub const NONE: EdgeOverlap = EdgeOverlap {
        own: 0,
        neighbor: 0,
    };

    pub fn is_none(&self) -> bool {
        self.own == 0 && self.neighbor == 0
    }
}

/// Split the overlap `b - a` between a tile and its neighbor.
///
/// `da` and `db` are the pixel sizes of the tile and the neighbor along the
/// boundary normal; `tie` is 0 when the neighbor is left/top and 1 when it
/// is right/bottom. Both widths are at least 1.
pub fn split_overlap(a: f64, da: f64, b: f64, db: f64, tie: f64) -> EdgeOverlap {
    let span = b - a;
    let own = ((span / da + tie - SPLIT_TOLERANCE) / 2.0).round_ties_even();
    let neighbor = ((span / db + 1.0 - tie - SPLIT_TOLERANCE) / 2.0).round_ties_even();
    EdgeOverlap {
        own: clamp_width(own),
        neighbor: clamp_width(neighbor),
    }
}

fn clamp_width(value: f64) -> usize {
    if value.is_finite() && value >= 1.0 {
        value as usize
    } else {
        1
    }
}

/// Overlap data for a single tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileOverlap {
    overlaps: [EdgeOverlap; 4],
    references: [Region; 4],
    /// Placement slice trimmed by the tile's own overlap widths
    pub unique: Region,
    /// Slot in the no-overlap mosaic
    pub noverlap: Region,
}

impl TileOverlap {
    /// Overlap widths toward `direction`.
    pub fn overlap(&self, direction: Direction) -> EdgeOverlap {
        self.overlaps[direction.index()]
    }

    /// Mosaic row or column read to receive the neighbor's boundary data.
    pub fn reference(&self, direction: Direction) -> &Region {
        &self.references[direction.index()]
    }
}

/// Overlap geometry of the whole grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapGeometry {
    tiles: Vec<TileOverlap>,
    noverlap_shape: (usize, usize),
}

impl OverlapGeometry {
    /// Resolve overlaps for every tile of an assembled grid.
    pub fn compute(index: &TileIndex, grid: &GlobalGrid) -> Result<Self, GridError> {
        let mosaic = grid.mosaic_shape();
        let n = grid.n_tiles();

        let mut overlaps = Vec::with_capacity(n);
        for tile in 0..n {
            let mut per_dir = [EdgeOverlap::NONE; 4];
            for dir in Direction::ALL {
                if let Some(neighbor) = grid.neighbor(tile, dir) {
                    per_dir[dir.index()] = edge_overlap(&index[tile], &index[neighbor], dir);
                }
            }
            overlaps.push(per_dir);
        }

        let (unique_rows, unique_cols) = unique_sizes(grid, &overlaps);
        let row_starts = cumulative_starts(&unique_rows);
        let col_starts = cumulative_starts(&unique_cols);

        let mut tiles = Vec::with_capacity(n);
        for (tile, per_dir) in overlaps.into_iter().enumerate() {
            let slice = grid.slice(tile);
            let references = edge_references(tile, slice, &per_dir, mosaic)?;
            let pos = grid.position(tile);
            let unique = trim(slice, &per_dir);
            let noverlap = Region::new(
                row_starts[pos.row]..row_starts[pos.row] + unique_rows[pos.row],
                col_starts[pos.col]..col_starts[pos.col] + unique_cols[pos.col],
            );
            tiles.push(TileOverlap {
                overlaps: per_dir,
                references,
                unique,
                noverlap,
            });
        }

        Ok(Self {
            tiles,
            noverlap_shape: (unique_rows.iter().sum(), unique_cols.iter().sum()),
        })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, tile: usize) -> &TileOverlap {
        &self.tiles[tile]
    }

    pub fn overlap(&self, tile: usize, direction: Direction) -> EdgeOverlap {
        self.tiles[tile].overlap(direction)
    }

    pub fn reference(&self, tile: usize, direction: Direction) -> &Region {
        self.tiles[tile].reference(direction)
    }

    /// Shape of the mosaic with all overlaps removed.
    pub fn noverlap_shape(&self) -> (usize, usize) {
        self.noverlap_shape
    }
}

fn edge_overlap(tile: &Tile, neighbor: &Tile, direction: Direction) -> EdgeOverlap {
    let own = tile.resolution();
    let other = neighbor.resolution();
    match direction {
        Direction::Left => split_overlap(
            tile.bounds().left,
            own.dlon,
            neighbor.bounds().right,
            other.dlon,
            0.0,
        ),
        Direction::Right => split_overlap(
            neighbor.bounds().left,
            own.dlon,
            tile.bounds().right,
            other.dlon,
            1.0,
        ),
        Direction::Top => split_overlap(
            tile.bounds().top,
            own.dlat,
            neighbor.bounds().bottom,
            other.dlat,
            0.0,
        ),
        Direction::Bottom => split_overlap(
            neighbor.bounds().top,
            own.dlat,
            tile.bounds().bottom,
            other.dlat,
            1.0,
        ),
    }
}

fn edge_references(
    tile: usize,
    slice: &Region,
    overlaps: &[EdgeOverlap; 4],
    mosaic: (usize, usize),
) -> Result<[Region; 4], GridError> {
    let out_of_bounds = |direction| GridError::ReferenceOutOfBounds { tile, direction };
    let width = |dir: Direction| overlaps[dir.index()].neighbor;

    let left = slice
        .cols
        .start
        .checked_sub(width(Direction::Left))
        .ok_or_else(|| out_of_bounds(Direction::Left))?;
    let right = (slice.cols.end + width(Direction::Right))
        .checked_sub(1)
        .filter(|&c| c < mosaic.1)
        .ok_or_else(|| out_of_bounds(Direction::Right))?;
    let top = slice
        .rows
        .start
        .checked_sub(width(Direction::Top))
        .ok_or_else(|| out_of_bounds(Direction::Top))?;
    let bottom = (slice.rows.end + width(Direction::Bottom))
        .checked_sub(1)
        .filter(|&r| r < mosaic.0)
        .ok_or_else(|| out_of_bounds(Direction::Bottom))?;

    Ok([
        Region::single_col(slice.rows.clone(), left),
        Region::single_col(slice.rows.clone(), right),
        Region::single_row(top, slice.cols.clone()),
        Region::single_row(bottom, slice.cols.clone()),
    ])
}

fn trim(slice: &Region, overlaps: &[EdgeOverlap; 4]) -> Region {
    let own = |dir: Direction| overlaps[dir.index()].own;
    let rows_end = slice
        .rows
        .end
        .saturating_sub(own(Direction::Bottom))
        .max(slice.rows.start);
    let cols_end = slice
        .cols
        .end
        .saturating_sub(own(Direction::Right))
        .max(slice.cols.start);
    Region::new(
        (slice.rows.start + own(Direction::Top)).min(rows_end)..rows_end,
        (slice.cols.start + own(Direction::Left)).min(cols_end)..cols_end,
    )
}

/// Unique (overlap-trimmed) row sizes from the first grid column and column
/// sizes from the first grid row. A hole there keeps the nominal size.
fn unique_sizes(grid: &GlobalGrid, overlaps: &[[EdgeOverlap; 4]]) -> (Vec<usize>, Vec<usize>) {
    let (n_rows, n_cols) = grid.shape();
    let rows = (0..n_rows)
        .map(|row| match grid.tile_at(row, 0) {
            Some(tile) => {
                let o = &overlaps[tile];
                let trimmed = o[Direction::Top.index()].own + o[Direction::Bottom.index()].own;
                grid.row_sizes()[row].saturating_sub(trimmed)
            }
            None => grid.row_sizes()[row],
        })
        .collect();
    let cols = (0..n_cols)
        .map(|col| match grid.tile_at(0, col) {
            Some(tile) => {
                let o = &overlaps[tile];
                let trimmed = o[Direction::Left.index()].own + o[Direction::Right.index()].own;
                grid.col_sizes()[col].saturating_sub(trimmed)
            }
            None => grid.col_sizes()[col],
        })
        .collect();
    (rows, cols)
}
