//! Global grid assembly and overlap resolution.
//!
//! Input tiles are clustered into a 2-D mosaic by their rounded origins.
//! Each tile receives a placement slice in the shared output arrays, and
//! every seam between two neighbors is split with a deterministic tie
//! rule so both sides agree on which pixels belong to whom.
//!
//! # Example
//!
//! ```
//! use hydromosaic::grid::{Direction, GlobalGrid, OverlapGeometry};
//! use hydromosaic::index::{Tile, TileIndex};
//! use hydromosaic::raster::{RasterMeta, Resolution};
//!
//! let res = Resolution::new(0.1, -0.1);
//! let index = TileIndex::from_tiles(vec![
//!     Tile::new("w.tif", RasterMeta::from_origin(0.0, 1.0, res, 10, 10)),
//!     Tile::new("e.tif", RasterMeta::from_origin(0.9, 1.0, res, 10, 10)),
//! ]);
//!
//! let grid = GlobalGrid::assemble(&index, 2).unwrap();
//! assert_eq!(grid.mosaic_shape(), (10, 20));
//!
//! let overlaps = OverlapGeometry::compute(&index, &grid).unwrap();
//! assert_eq!(overlaps.overlap(0, Direction::Right).own, 1);
//! assert!(overlaps.overlap(0, Direction::Left).is_none());
//! ```

mod assembler;
mod error;
mod overlap;
mod region;

pub use assembler::{GlobalGrid, GridPosition, DEFAULT_ROUND_DECIMALS};
pub use error::GridError;
pub use overlap::{split_overlap, EdgeOverlap, OverlapGeometry, TileOverlap};
pub use region::{Direction, Region};
