//! In-memory chunked store.

use super::block::Block;
use super::error::StoreError;
use super::r#trait::{check_access, ArraySpec, ChunkedStore};
use crate::grid::Region;
use std::collections::HashMap;
use std::sync::RwLock;

struct MemoryArray {
    spec: ArraySpec,
    data: Block,
}

/// Store keeping every array as one dense block in memory.
///
/// Each write is applied under a single lock, so writers never clobber each
/// other. Used for tests and small mosaics.
#[derive(Default)]
pub struct MemoryStore {
    arrays: RwLock<HashMap<String, MemoryArray>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all arrays, sorted.
    pub fn names(&self) -> Vec<String> {
        let arrays = self.arrays.read().unwrap();
        let mut names: Vec<String> = arrays.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ChunkedStore for MemoryStore {
    fn open(&self, spec: &ArraySpec) -> Result<(), StoreError> {
        let mut arrays = self.arrays.write().unwrap();
        if let Some(existing) = arrays.get(&spec.name) {
            if !existing.spec.is_compatible(spec) {
                return Err(StoreError::SpecMismatch {
                    name: spec.name.clone(),
                    existing: existing.spec.describe(),
                    requested: spec.describe(),
                });
            }
            return Ok(());
        }
        arrays.insert(
            spec.name.clone(),
            MemoryArray {
                spec: spec.clone(),
                data: Block::filled(spec.dtype, spec.shape),
            },
        );
        Ok(())
    }

    fn read(&self, name: &str, region: &Region) -> Result<Block, StoreError> {
        let arrays = self.arrays.read().unwrap();
        let array = arrays
            .get(name)
            .ok_or_else(|| StoreError::UnknownArray(name.to_string()))?;
        check_access(&array.spec, region, None)?;
        Ok(array.data.extract(region.rows.start, region.cols.start, region.shape()))
    }

    fn write(&self, name: &str, region: &Region, block: &Block) -> Result<(), StoreError> {
        let mut arrays = self.arrays.write().unwrap();
        let array = arrays
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownArray(name.to_string()))?;
        check_access(&array.spec, region, Some(block))?;
        array.data.paste(region.rows.start, region.cols.start, block);
        Ok(())
    }

    fn spec(&self, name: &str) -> Result<ArraySpec, StoreError> {
        let arrays = self.arrays.read().unwrap();
        arrays
            .get(name)
            .map(|a| a.spec.clone())
            .ok_or_else(|| StoreError::UnknownArray(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Grid;
    use crate::store::DType;

    fn store_with(spec: &ArraySpec) -> MemoryStore {
        let store = MemoryStore::new();
        store.open(spec).unwrap();
        store
    }

    #[test]
    fn test_open_is_idempotent() {
        let spec = ArraySpec::new("uca", (4, 6), (2, 3), DType::F32);
        let store = store_with(&spec);
        let region = Region::new(0..1, 0..1);
        store.write("uca", &region, &Block::F32(Grid::filled(1, 1, 7.0))).unwrap();

        store.open(&spec).unwrap();
        let block = store.read("uca", &region).unwrap();
        assert_eq!(block.as_f32().unwrap().get(0, 0), 7.0);
        assert_eq!(store.shape("uca").unwrap(), (4, 6));
    }

    #[test]
    fn test_open_rejects_different_shape() {
        let store = store_with(&ArraySpec::new("uca", (4, 6), (2, 3), DType::F32));
        let err = store
            .open(&ArraySpec::new("uca", (5, 6), (2, 3), DType::F32))
            .unwrap_err();
        assert!(matches!(err, StoreError::SpecMismatch { .. }));
    }

    #[test]
    fn test_read_write_region() {
        let store = store_with(&ArraySpec::new("edge_todo", (4, 4), (2, 2), DType::Bool));
        let region = Region::new(1..3, 2..4);
        store
            .write("edge_todo", &region, &Block::Bool(Grid::filled(2, 2, true)))
            .unwrap();

        let full = store.read("edge_todo", &Region::full((4, 4))).unwrap();
        let grid = full.as_bool().unwrap();
        let set: usize = grid.as_slice().iter().filter(|v| **v).count();
        assert_eq!(set, 4);
        assert!(grid.get(1, 2) && grid.get(2, 3));
        assert!(!grid.get(0, 0));
    }

    #[test]
    fn test_unknown_array() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.read("elev", &Region::new(0..1, 0..1)),
            Err(StoreError::UnknownArray(_))
        ));
        assert!(!store.contains("elev"));
    }

    #[test]
    fn test_write_validation() {
        let store = store_with(&ArraySpec::new("slope", (2, 2), (2, 2), DType::F32));
        let region = Region::new(0..2, 0..2);

        let err = store
            .write("slope", &region, &Block::Bool(Grid::filled(2, 2, true)))
            .unwrap_err();
        assert!(matches!(err, StoreError::DTypeMismatch { .. }));

        let err = store
            .write("slope", &region, &Block::F32(Grid::filled(1, 2, 0.0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::BlockShape { .. }));

        let err = store
            .write("slope", &Region::new(1..3, 0..2), &Block::F32(Grid::filled(2, 2, 0.0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::RegionOutOfBounds { .. }));
    }
}
