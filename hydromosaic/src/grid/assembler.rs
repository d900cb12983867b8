//! Clusters independently georeferenced tiles into a row/column mosaic.

use super::error::GridError;
use super::region::{Direction, Region};
use crate::index::TileIndex;
use std::collections::BTreeSet;
use std::fmt;

/// Default number of decimals used when clustering tile origins.
pub const DEFAULT_ROUND_DECIMALS: u32 = 2;

/// A tile's row and column in the global grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

/// The assembled mosaic layout.
///
/// Holds the sparse `(row, col) -> tile` mapping, the per-row and per-column
/// sizes in pixels and every tile's placement slice in the shared output
/// arrays. Read-only once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalGrid {
    grid_shape: (usize, usize),
    cells: Vec<Option<usize>>,
    positions: Vec<GridPosition>,
    row_sizes: Vec<usize>,
    col_sizes: Vec<usize>,
    slices: Vec<Region>,
}

impl GlobalGrid {
    /// Assemble the grid for every tile of the index.
    ///
    /// Tile origins (top latitude, left longitude) are rounded to
    /// `round_decimals` decimals; equal rounded values share a grid row or
    /// column. Rows run north to south, columns west to east.
    pub fn assemble(index: &TileIndex, round_decimals: u32) -> Result<Self, GridError> {
        if index.is_empty() {
            return Err(GridError::NoTiles);
        }

        let scale = 10f64.powi(round_decimals as i32);
        let lat_keys: Vec<i64> = index
            .iter()
            .map(|t| rounded_key(t.bounds().top, scale))
            .collect();
        let lon_keys: Vec<i64> = index
            .iter()
            .map(|t| rounded_key(t.bounds().left, scale))
            .collect();

        // Latitude descending, longitude ascending
        let unique_lats: Vec<i64> = lat_keys
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .rev()
            .collect();
        let unique_lons: Vec<i64> = lon_keys
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let n_rows = unique_lats.len();
        let n_cols = unique_lons.len();
        let mut cells: Vec<Option<usize>> = vec![None; n_rows * n_cols];
        let mut positions = Vec::with_capacity(index.len());

        for (tile, (lat, lon)) in lat_keys.iter().zip(&lon_keys).enumerate() {
            // Both keys were taken from these same vectors
            let row = unique_lats.iter().position(|k| k == lat).unwrap_or(0);
            let col = unique_lons.iter().position(|k| k == lon).unwrap_or(0);
            let cell = &mut cells[row * n_cols + col];
            if let Some(first) = *cell {
                return Err(GridError::DuplicateCell {
                    row,
                    col,
                    first,
                    second: tile,
                });
            }
            *cell = Some(tile);
            positions.push(GridPosition { row, col });
        }

        let mut row_sizes: Vec<Option<usize>> = vec![None; n_rows];
        let mut col_sizes: Vec<Option<usize>> = vec![None; n_cols];
        for (tile, pos) in positions.iter().enumerate() {
            let t = &index[tile];
            match row_sizes[pos.row] {
                None => row_sizes[pos.row] = Some(t.rows()),
                Some(expected) if expected != t.rows() => {
                    return Err(GridError::InconsistentRowSize {
                        row: pos.row,
                        tile,
                        expected,
                        found: t.rows(),
                    })
                }
                Some(_) => {}
            }
            match col_sizes[pos.col] {
                None => col_sizes[pos.col] = Some(t.cols()),
                Some(expected) if expected != t.cols() => {
                    return Err(GridError::InconsistentColumnSize {
                        col: pos.col,
                        tile,
                        expected,
                        found: t.cols(),
                    })
                }
                Some(_) => {}
            }
        }

        // Every row and column holds at least one tile by construction
        let row_sizes: Vec<usize> = row_sizes.into_iter().map(|s| s.unwrap_or(0)).collect();
        let col_sizes: Vec<usize> = col_sizes.into_iter().map(|s| s.unwrap_or(0)).collect();

        let row_starts = cumulative_starts(&row_sizes);
        let col_starts = cumulative_starts(&col_sizes);
        let slices = positions
            .iter()
            .map(|pos| {
                Region::new(
                    row_starts[pos.row]..row_starts[pos.row] + row_sizes[pos.row],
                    col_starts[pos.col]..col_starts[pos.col] + col_sizes[pos.col],
                )
            })
            .collect();

        Ok(Self {
            grid_shape: (n_rows, n_cols),
            cells,
            positions,
            row_sizes,
            col_sizes,
            slices,
        })
    }

    /// Grid shape as `(grid rows, grid columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.grid_shape
    }

    /// Number of tiles placed in the grid.
    pub fn n_tiles(&self) -> usize {
        self.positions.len()
    }

    /// Total mosaic shape in pixels.
    pub fn mosaic_shape(&self) -> (usize, usize) {
        (self.row_sizes.iter().sum(), self.col_sizes.iter().sum())
    }

    /// Chunk shape for mosaic-sized arrays: smallest row size by smallest
    /// column size.
    pub fn chunk_shape(&self) -> (usize, usize) {
        (
            self.row_sizes.iter().copied().min().unwrap_or(1).max(1),
            self.col_sizes.iter().copied().min().unwrap_or(1).max(1),
        )
    }

    pub fn row_sizes(&self) -> &[usize] {
        &self.row_sizes
    }

    pub fn col_sizes(&self) -> &[usize] {
        &self.col_sizes
    }

    pub fn position(&self, tile: usize) -> GridPosition {
        self.positions[tile]
    }

    /// Placement slice of a tile in the mosaic.
    pub fn slice(&self, tile: usize) -> &Region {
        &self.slices[tile]
    }

    /// Tile occupying a grid cell, if any.
    pub fn tile_at(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.grid_shape.0 || col >= self.grid_shape.1 {
            return None;
        }
        self.cells[row * self.grid_shape.1 + col]
    }

    /// Neighbor of `tile` in the given direction, `None` at the grid edge or
    /// towards a hole.
    pub fn neighbor(&self, tile: usize, direction: Direction) -> Option<usize> {
        let pos = self.positions[tile];
        let (dr, dc) = direction.offset();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        self.tile_at(row, col)
    }

    /// All existing neighbors of `tile`.
    pub fn neighbors(&self, tile: usize) -> Vec<usize> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.neighbor(tile, dir))
            .collect()
    }
}

impl fmt::Display for GlobalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.n_tiles().to_string().len().max(1);
        for row in 0..self.grid_shape.0 {
            let cells: Vec<String> = (0..self.grid_shape.1)
                .map(|col| match self.tile_at(row, col) {
                    Some(tile) => format!("{:>width$}", tile, width = width),
                    None => format!("{:>width$}", ".", width = width),
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Round a coordinate to a fixed number of decimals as an integer key.
/// Ties round to even.
fn rounded_key(value: f64, scale: f64) -> i64 {
    (value * scale).round_ties_even() as i64
}

pub(super) fn cumulative_starts(sizes: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(sizes.len());
    let mut acc = 0;
    for &size in sizes {
        starts.push(acc);
        acc += size;
    }
    starts
}
