//! Per-tile, per-stage completion flags.

use crate::grid::Region;
use crate::raster::Grid;
use crate::store::{names, Block, ChunkedStore, DType, StoreError};
use std::fmt;

/// Pipeline stages with a success column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Elevation,
    SlopeAspect,
    Uca,
    UcaEdge,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Elevation, Stage::SlopeAspect, Stage::Uca, Stage::UcaEdge];

    /// Column in the success table.
    pub fn column(self) -> usize {
        match self {
            Stage::Elevation => 0,
            Stage::SlopeAspect => 1,
            Stage::Uca => 2,
            Stage::UcaEdge => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Elevation => "elevation",
            Stage::SlopeAspect => "aspect/slope",
            Stage::Uca => "uca",
            Stage::UcaEdge => "uca edges",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Success flags for every tile and stage.
///
/// Owned by the driver; persisted in the `success` array so an interrupted
/// run resumes where it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessTable {
    flags: Vec<[bool; 4]>,
}

impl SuccessTable {
    /// Table with every flag cleared.
    pub fn new(n_tiles: usize) -> Self {
        Self {
            flags: vec![[false; 4]; n_tiles],
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, tile: usize, stage: Stage) -> bool {
        self.flags[tile][stage.column()]
    }

    pub fn set(&mut self, tile: usize, stage: Stage, value: bool) {
        self.flags[tile][stage.column()] = value;
    }

    /// Flags of one stage for all tiles.
    pub fn column(&self, stage: Stage) -> Vec<bool> {
        self.flags.iter().map(|row| row[stage.column()]).collect()
    }

    pub fn set_column(&mut self, stage: Stage, values: &[bool]) {
        for (row, &value) in self.flags.iter_mut().zip(values) {
            row[stage.column()] = value;
        }
    }

    /// Number of tiles that completed `stage`.
    pub fn count(&self, stage: Stage) -> usize {
        self.flags.iter().filter(|row| row[stage.column()]).count()
    }

    /// Load the table from the store's `success` array.
    pub fn load(store: &dyn ChunkedStore, n_tiles: usize) -> Result<Self, StoreError> {
        let block = store.read(names::SUCCESS, &Region::full((n_tiles, Stage::ALL.len())))?;
        let found = block.dtype();
        let grid = block.into_bool().ok_or_else(|| StoreError::DTypeMismatch {
            name: names::SUCCESS.to_string(),
            expected: DType::Bool,
            found,
        })?;
        let flags = (0..n_tiles)
            .map(|t| [grid.get(t, 0), grid.get(t, 1), grid.get(t, 2), grid.get(t, 3)])
            .collect();
        Ok(Self { flags })
    }

    /// Persist the table to the store's `success` array.
    pub fn save(&self, store: &dyn ChunkedStore) -> Result<(), StoreError> {
        let grid = Grid::from_fn(self.len(), Stage::ALL.len(), |t, s| self.flags[t][s]);
        store.write(
            names::SUCCESS,
            &Region::full((self.len(), Stage::ALL.len())),
            &Block::Bool(grid),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArraySpec, MemoryStore};

    #[test]
    fn test_set_and_column() {
        let mut table = SuccessTable::new(3);
        table.set(1, Stage::Uca, true);
        assert!(table.get(1, Stage::Uca));
        assert_eq!(table.column(Stage::Uca), vec![false, true, false]);

        table.set_column(Stage::Elevation, &[true, true, false]);
        assert_eq!(table.count(Stage::Elevation), 2);
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        store
            .open(&ArraySpec::new(names::SUCCESS, (2, 4), (2, 4), DType::Bool))
            .unwrap();

        let mut table = SuccessTable::new(2);
        table.set(0, Stage::Elevation, true);
        table.set(1, Stage::UcaEdge, true);
        table.save(&store).unwrap();

        let loaded = SuccessTable::load(&store, 2).unwrap();
        assert_eq!(loaded, table);
    }
}
