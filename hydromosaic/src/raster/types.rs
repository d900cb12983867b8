//! Raster type definitions

use std::fmt;
use thiserror::Error;

/// Geographic bounds of a raster in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// West edge (longitude)
    pub left: f64,
    /// South edge (latitude)
    pub bottom: f64,
    /// East edge (longitude)
    pub right: f64,
    /// North edge (latitude)
    pub top: f64,
}

impl Bounds {
    /// Create bounds from the four edges.
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}] x [{:.6}, {:.6}]",
            self.left, self.right, self.bottom, self.top
        )
    }
}

/// Pixel size in degrees.
///
/// `dlat` is negative for north-up rasters, matching the affine transform of
/// the source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Pixel width (longitude step per column)
    pub dlon: f64,
    /// Pixel height (latitude step per row, conventionally negative)
    pub dlat: f64,
}

impl Resolution {
    /// Create a resolution from longitude and latitude steps.
    pub fn new(dlon: f64, dlat: f64) -> Self {
        Self { dlon, dlat }
    }
}

/// Georeferencing metadata of one raster file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterMeta {
    /// Geographic bounds
    pub bounds: Bounds,
    /// Pixel resolution
    pub resolution: Resolution,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl RasterMeta {
    /// Build metadata for a north-up raster anchored at its top-left corner.
    pub fn from_origin(
        left: f64,
        top: f64,
        resolution: Resolution,
        rows: usize,
        cols: usize,
    ) -> Self {
        let right = left + cols as f64 * resolution.dlon;
        let bottom = top + rows as f64 * resolution.dlat;
        Self {
            bounds: Bounds::new(left, bottom, right, top),
            resolution,
            rows,
            cols,
        }
    }

    /// Raster shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

/// A buffer length that does not match the requested shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer of length {len} cannot hold a {rows}x{cols} grid")]
pub struct ShapeMismatch {
    pub rows: usize,
    pub cols: usize,
    pub len: usize,
}

/// Dense row-major 2-D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, ShapeMismatch> {
        if data.len() != rows * cols {
            return Err(ShapeMismatch {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Copy of a single row.
    pub fn row(&self, row: usize) -> Vec<T> {
        self.data[row * self.cols..(row + 1) * self.cols].to_vec()
    }

    /// Copy of a single column.
    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Apply `f` to every cell, producing a grid of the same shape.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| f(*v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_origin_computes_bounds() {
        let meta = RasterMeta::from_origin(10.0, 50.0, Resolution::new(0.5, -0.25), 4, 6);
        assert_eq!(meta.bounds.left, 10.0);
        assert_eq!(meta.bounds.right, 13.0);
        assert_eq!(meta.bounds.top, 50.0);
        assert_eq!(meta.bounds.bottom, 49.0);
        assert_eq!(meta.shape(), (4, 6));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = Grid::from_vec(2, 3, vec![0.0f32; 5]).unwrap_err();
        assert_eq!(err.len, 5);
        assert!(err.to_string().contains("2x3"));
    }

    #[test]
    fn test_row_and_column_access() {
        let grid = Grid::from_fn(3, 4, |r, c| (r * 10 + c) as f32);
        assert_eq!(grid.row(1), vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(grid.column(2), vec![2.0, 12.0, 22.0]);
        assert_eq!(grid.get(2, 3), 23.0);
    }

    #[test]
    fn test_set_and_map() {
        let mut grid = Grid::filled(2, 2, 0u8);
        grid.set(1, 0, 7);
        let doubled = grid.map(|v| v as u32 * 2);
        assert_eq!(doubled.as_slice(), &[0, 0, 14, 0]);
    }
}
