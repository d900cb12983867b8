//! Chunked array store abstraction.

use super::block::{Block, DType};
use super::error::StoreError;
use crate::grid::Region;

/// Description of a named 2-D array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySpec {
    /// Array name, unique within a store
    pub name: String,
    /// Full array shape `(rows, cols)`
    pub shape: (usize, usize),
    /// Chunk shape used for on-disk layout
    pub chunks: (usize, usize),
    /// Element type
    pub dtype: DType,
}

impl ArraySpec {
    pub fn new(
        name: impl Into<String>,
        shape: (usize, usize),
        chunks: (usize, usize),
        dtype: DType,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            chunks: (chunks.0.max(1), chunks.1.max(1)),
            dtype,
        }
    }

    /// Whether an existing array can be reused for this spec.
    pub fn is_compatible(&self, other: &ArraySpec) -> bool {
        self.shape == other.shape && self.dtype == other.dtype
    }

    pub(crate) fn describe(&self) -> String {
        format!("shape {:?} dtype {}", self.shape, self.dtype)
    }
}

/// Shared storage for the mosaic-sized output arrays.
///
/// Implementations are shared between worker threads. Individual `write`
/// calls need not be atomic with respect to each other: two writers whose
/// regions share a chunk may clobber one another, which callers reconcile
/// through [`write_verified`](super::write_verified).
///
/// # Example
///
/// ```
/// use hydromosaic::grid::Region;
/// use hydromosaic::raster::Grid;
/// use hydromosaic::store::{ArraySpec, Block, ChunkedStore, DType, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.open(&ArraySpec::new("elev", (4, 4), (2, 2), DType::F32)).unwrap();
///
/// let region = Region::new(0..2, 0..2);
/// store.write("elev", &region, &Block::F32(Grid::filled(2, 2, 1.5))).unwrap();
/// let block = store.read("elev", &region).unwrap();
/// assert_eq!(block.as_f32().unwrap().get(1, 1), 1.5);
/// ```
pub trait ChunkedStore: Send + Sync {
    /// Open an array, creating it filled with NaN/false if it does not
    /// exist. Re-opening with a compatible spec is a no-op.
    fn open(&self, spec: &ArraySpec) -> Result<(), StoreError>;

    /// Read a region of an array.
    fn read(&self, name: &str, region: &Region) -> Result<Block, StoreError>;

    /// Write a block into a region of an array.
    fn write(&self, name: &str, region: &Region, block: &Block) -> Result<(), StoreError>;

    /// Spec of an opened array.
    fn spec(&self, name: &str) -> Result<ArraySpec, StoreError>;

    /// Shape of an opened array.
    fn shape(&self, name: &str) -> Result<(usize, usize), StoreError> {
        self.spec(name).map(|spec| spec.shape)
    }

    /// Whether the array exists.
    fn contains(&self, name: &str) -> bool {
        self.spec(name).is_ok()
    }
}

/// Validate a region and, for writes, the block against an array spec.
pub(crate) fn check_access(
    spec: &ArraySpec,
    region: &Region,
    block: Option<&Block>,
) -> Result<(), StoreError> {
    if !region.fits_within(spec.shape) {
        return Err(StoreError::RegionOutOfBounds {
            name: spec.name.clone(),
            region: region.clone(),
            shape: spec.shape,
        });
    }
    if let Some(block) = block {
        if block.dtype() != spec.dtype {
            return Err(StoreError::DTypeMismatch {
                name: spec.name.clone(),
                expected: spec.dtype,
                found: block.dtype(),
            });
        }
        if block.shape() != region.shape() {
            return Err(StoreError::BlockShape {
                name: spec.name.clone(),
                expected: region.shape(),
                found: block.shape(),
            });
        }
    }
    Ok(())
}
