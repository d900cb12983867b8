//! Typed array blocks exchanged with a store.

use crate::raster::Grid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit float, missing values are NaN
    F32,
    /// Boolean flag, stored as one byte
    Bool,
}

impl DType {
    /// Encoded size of one element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::Bool => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rectangular block of array values.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    F32(Grid<f32>),
    Bool(Grid<bool>),
}

impl Block {
    /// Block of the given dtype holding the fill value (NaN or false).
    pub fn filled(dtype: DType, shape: (usize, usize)) -> Self {
        match dtype {
            DType::F32 => Block::F32(Grid::filled(shape.0, shape.1, f32::NAN)),
            DType::Bool => Block::Bool(Grid::filled(shape.0, shape.1, false)),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            Block::F32(_) => DType::F32,
            Block::Bool(_) => DType::Bool,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Block::F32(g) => g.shape(),
            Block::Bool(g) => g.shape(),
        }
    }

    pub fn as_f32(&self) -> Option<&Grid<f32>> {
        match self {
            Block::F32(g) => Some(g),
            Block::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<&Grid<bool>> {
        match self {
            Block::Bool(g) => Some(g),
            Block::F32(_) => None,
        }
    }

    pub fn into_f32(self) -> Option<Grid<f32>> {
        match self {
            Block::F32(g) => Some(g),
            Block::Bool(_) => None,
        }
    }

    pub fn into_bool(self) -> Option<Grid<bool>> {
        match self {
            Block::Bool(g) => Some(g),
            Block::F32(_) => None,
        }
    }

    /// Copy `src` into this block with its top-left corner at `(row, col)`.
    ///
    /// Both blocks must share a dtype and `src` must fit.
    pub(crate) fn paste(&mut self, row: usize, col: usize, src: &Block) {
        match (self, src) {
            (Block::F32(dst), Block::F32(src)) => paste_grid(dst, row, col, src),
            (Block::Bool(dst), Block::Bool(src)) => paste_grid(dst, row, col, src),
            _ => {}
        }
    }

    /// Extract the sub-block at `(row, col)` with the given shape.
    pub(crate) fn extract(&self, row: usize, col: usize, shape: (usize, usize)) -> Block {
        match self {
            Block::F32(g) => Block::F32(extract_grid(g, row, col, shape)),
            Block::Bool(g) => Block::Bool(extract_grid(g, row, col, shape)),
        }
    }
}

impl From<Grid<f32>> for Block {
    fn from(grid: Grid<f32>) -> Self {
        Block::F32(grid)
    }
}

impl From<Grid<bool>> for Block {
    fn from(grid: Grid<bool>) -> Self {
        Block::Bool(grid)
    }
}

fn paste_grid<T: Copy>(dst: &mut Grid<T>, row: usize, col: usize, src: &Grid<T>) {
    for r in 0..src.rows() {
        for c in 0..src.cols() {
            dst.set(row + r, col + c, src.get(r, c));
        }
    }
}

fn extract_grid<T: Copy>(src: &Grid<T>, row: usize, col: usize, shape: (usize, usize)) -> Grid<T> {
    Grid::from_fn(shape.0, shape.1, |r, c| src.get(row + r, col + c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_block() {
        let block = Block::filled(DType::F32, (2, 3));
        assert_eq!(block.shape(), (2, 3));
        assert!(block.as_f32().unwrap().as_slice().iter().all(|v| v.is_nan()));

        let block = Block::filled(DType::Bool, (1, 1));
        assert!(!block.as_bool().unwrap().get(0, 0));
    }

    #[test]
    fn test_paste_and_extract() {
        let mut block = Block::filled(DType::Bool, (3, 3));
        let patch = Block::Bool(Grid::filled(2, 2, true));
        block.paste(1, 1, &patch);

        let grid = block.as_bool().unwrap();
        assert!(!grid.get(0, 0));
        assert!(grid.get(1, 1) && grid.get(2, 2));
        assert_eq!(block.extract(1, 1, (2, 2)), patch);
    }

    #[test]
    fn test_dtype_serde_names() {
        assert_eq!(serde_json::to_string(&DType::F32).unwrap(), "\"f32\"");
        assert_eq!(serde_json::from_str::<DType>("\"bool\"").unwrap(), DType::Bool);
    }
}
