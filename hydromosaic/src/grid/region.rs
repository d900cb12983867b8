//! Mosaic index ranges and tile directions.

use std::fmt;
use std::ops::Range;

/// One of the four tile boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
}

impl Direction {
    /// All directions in canonical order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Top,
        Direction::Bottom,
    ];

    /// Position of this direction in [`Direction::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
            Direction::Top => 2,
            Direction::Bottom => 3,
        }
    }

    /// Grid offset `(drow, dcol)` towards the neighbor in this direction.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Top => (-1, 0),
            Direction::Bottom => (1, 0),
        }
    }

    /// The direction seen from the neighbor's side.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
        }
    }

    /// Whether the boundary runs along a column (left/right edges).
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Top => "top",
            Direction::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open 2-D index range into the mosaic (or into a tile).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// Row range
    pub rows: Range<usize>,
    /// Column range
    pub cols: Range<usize>,
}

impl Region {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    /// Region covering a whole `(rows, cols)` array.
    pub fn full(shape: (usize, usize)) -> Self {
        Self::new(0..shape.0, 0..shape.1)
    }

    /// A single mosaic row restricted to `cols`.
    pub fn single_row(row: usize, cols: Range<usize>) -> Self {
        Self::new(row..row + 1, cols)
    }

    /// A single mosaic column restricted to `rows`.
    pub fn single_col(rows: Range<usize>, col: usize) -> Self {
        Self::new(rows, col..col + 1)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows.end.saturating_sub(self.rows.start)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cols.end.saturating_sub(self.cols.start)
    }

    /// Shape as `(height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// Whether the region lies inside an array of the given shape.
    pub fn fits_within(&self, shape: (usize, usize)) -> bool {
        self.rows.start <= self.rows.end
            && self.cols.start <= self.cols.end
            && self.rows.end <= shape.0
            && self.cols.end <= shape.1
    }

    /// The outermost row or column of this region on the given side.
    pub fn edge(&self, direction: Direction) -> Region {
        match direction {
            Direction::Left => Region::single_col(self.rows.clone(), self.cols.start),
            Direction::Right => Region::single_col(self.rows.clone(), self.cols.end - 1),
            Direction::Top => Region::single_row(self.rows.start, self.cols.clone()),
            Direction::Bottom => Region::single_row(self.rows.end - 1, self.cols.clone()),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}, {}:{}]",
            self.rows.start, self.rows.end, self.cols.start, self.cols.end
        )
    }
}
