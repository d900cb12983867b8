//! On-disk chunked store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<array>/.array.json   shape, chunk shape and dtype
//! <root>/<array>/<ci>.<cj>     little-endian chunk data
//! ```
//!
//! Chunks never written read back as the fill value. Edge chunks are
//! truncated to the array bounds. A partial chunk write is a
//! read-modify-write of the whole chunk file with no locking, so writers
//! sharing a chunk can clobber each other's data.

use super::block::{Block, DType};
use super::error::StoreError;
use super::r#trait::{check_access, ArraySpec, ChunkedStore};
use crate::grid::Region;
use crate::log::{Logger, NoOpLogger};
use crate::log_debug;
use crate::raster::Grid;
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

const META_FILE: &str = ".array.json";

/// Persisted array metadata.
#[derive(Debug, Serialize, Deserialize)]
struct ArrayMeta {
    shape: (usize, usize),
    chunks: (usize, usize),
    dtype: DType,
}

/// Chunked store backed by a directory tree.
pub struct DirectoryStore {
    root: PathBuf,
    specs: RwLock<HashMap<String, ArraySpec>>,
    temp_counter: AtomicU64,
    logger: Arc<dyn Logger>,
}

impl DirectoryStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            specs: RwLock::new(HashMap::new()),
            temp_counter: AtomicU64::new(0),
            logger: Arc::new(NoOpLogger),
        })
    }

    /// Log array creation through `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn array_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn chunk_path(&self, name: &str, ci: usize, cj: usize) -> PathBuf {
        self.array_dir(name).join(format!("{}.{}", ci, cj))
    }

    /// Cached spec, falling back to the metadata file on disk.
    fn load_spec(&self, name: &str) -> Result<Option<ArraySpec>, StoreError> {
        if let Some(spec) = self.specs.read().unwrap().get(name) {
            return Ok(Some(spec.clone()));
        }

        let path = self.array_dir(name).join(META_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let meta: ArrayMeta =
            serde_json::from_str(&text).map_err(|source| StoreError::Metadata { path, source })?;
        let spec = ArraySpec::new(name, meta.shape, meta.chunks, meta.dtype);
        self.specs
            .write()
            .unwrap()
            .insert(name.to_string(), spec.clone());
        Ok(Some(spec))
    }

    fn require_spec(&self, name: &str) -> Result<ArraySpec, StoreError> {
        self.load_spec(name)?
            .ok_or_else(|| StoreError::UnknownArray(name.to_string()))
    }

    fn read_chunk(&self, spec: &ArraySpec, ci: usize, cj: usize) -> Result<Block, StoreError> {
        let extent = chunk_extent(spec, ci, cj);
        let (rows, cols) = extent.shape();
        let path = self.chunk_path(&spec.name, ci, cj);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Block::filled(spec.dtype, (rows, cols)));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let expected = rows * cols * spec.dtype.size_bytes();
        if bytes.len() != expected {
            return Err(StoreError::CorruptChunk {
                path,
                expected,
                found: bytes.len(),
            });
        }

        Ok(decode(spec.dtype, &bytes, rows, cols))
    }

    fn write_chunk(
        &self,
        spec: &ArraySpec,
        ci: usize,
        cj: usize,
        block: &Block,
    ) -> Result<(), StoreError> {
        let path = self.chunk_path(&spec.name, ci, cj);
        let temp = path.with_extension(format!(
            "tmp{}-{}",
            std::process::id(),
            self.temp_counter.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&temp, encode(block)).map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl ChunkedStore for DirectoryStore {
    fn open(&self, spec: &ArraySpec) -> Result<(), StoreError> {
        if let Some(existing) = self.load_spec(&spec.name)? {
            if !existing.is_compatible(spec) {
                return Err(StoreError::SpecMismatch {
                    name: spec.name.clone(),
                    existing: existing.describe(),
                    requested: spec.describe(),
                });
            }
            return Ok(());
        }

        let dir = self.array_dir(&spec.name);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let meta = ArrayMeta {
            shape: spec.shape,
            chunks: spec.chunks,
            dtype: spec.dtype,
        };
        let path = dir.join(META_FILE);
        let text = serde_json::to_string_pretty(&meta).map_err(|source| StoreError::Metadata {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| StoreError::Io { path, source })?;

        log_debug!(
            self.logger,
            "Created array {} with shape {:?}, chunks {:?}",
            spec.name,
            spec.shape,
            spec.chunks
        );
        self.specs
            .write()
            .unwrap()
            .insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    fn read(&self, name: &str, region: &Region) -> Result<Block, StoreError> {
        let spec = self.require_spec(name)?;
        check_access(&spec, region, None)?;

        let mut out = Block::filled(spec.dtype, region.shape());
        for (ci, cj) in chunks_overlapping(&spec, region) {
            let extent = chunk_extent(&spec, ci, cj);
            let part = intersect(&extent, region);
            let chunk = self.read_chunk(&spec, ci, cj)?;
            let piece = chunk.extract(
                part.rows.start - extent.rows.start,
                part.cols.start - extent.cols.start,
                part.shape(),
            );
            out.paste(
                part.rows.start - region.rows.start,
                part.cols.start - region.cols.start,
                &piece,
            );
        }
        Ok(out)
    }

    fn write(&self, name: &str, region: &Region, block: &Block) -> Result<(), StoreError> {
        let spec = self.require_spec(name)?;
        check_access(&spec, region, Some(block))?;

        for (ci, cj) in chunks_overlapping(&spec, region) {
            let extent = chunk_extent(&spec, ci, cj);
            let part = intersect(&extent, region);
            let piece = block.extract(
                part.rows.start - region.rows.start,
                part.cols.start - region.cols.start,
                part.shape(),
            );

            let chunk = if part == extent {
                piece
            } else {
                let mut chunk = self.read_chunk(&spec, ci, cj)?;
                chunk.paste(
                    part.rows.start - extent.rows.start,
                    part.cols.start - extent.cols.start,
                    &piece,
                );
                chunk
            };
            self.write_chunk(&spec, ci, cj, &chunk)?;
        }
        Ok(())
    }

    fn spec(&self, name: &str) -> Result<ArraySpec, StoreError> {
        self.require_spec(name)
    }
}

fn chunk_extent(spec: &ArraySpec, ci: usize, cj: usize) -> Region {
    let r0 = ci * spec.chunks.0;
    let c0 = cj * spec.chunks.1;
    Region::new(
        r0..(r0 + spec.chunks.0).min(spec.shape.0),
        c0..(c0 + spec.chunks.1).min(spec.shape.1),
    )
}

fn chunks_overlapping(spec: &ArraySpec, region: &Region) -> Vec<(usize, usize)> {
    if region.is_empty() {
        return Vec::new();
    }
    let first_row = region.rows.start / spec.chunks.0;
    let last_row = (region.rows.end - 1) / spec.chunks.0;
    let first_col = region.cols.start / spec.chunks.1;
    let last_col = (region.cols.end - 1) / spec.chunks.1;
    (first_row..=last_row)
        .flat_map(|ci| (first_col..=last_col).map(move |cj| (ci, cj)))
        .collect()
}

fn intersect(a: &Region, b: &Region) -> Region {
    Region::new(
        a.rows.start.max(b.rows.start)..a.rows.end.min(b.rows.end),
        a.cols.start.max(b.cols.start)..a.cols.end.min(b.cols.end),
    )
}

fn encode(block: &Block) -> Vec<u8> {
    match block {
        Block::F32(grid) => {
            let mut bytes = vec![0u8; grid.len() * 4];
            LittleEndian::write_f32_into(grid.as_slice(), &mut bytes);
            bytes
        }
        Block::Bool(grid) => grid.as_slice().iter().map(|&v| v as u8).collect(),
    }
}

fn decode(dtype: DType, bytes: &[u8], rows: usize, cols: usize) -> Block {
    match dtype {
        DType::F32 => {
            let mut values = vec![0f32; rows * cols];
            LittleEndian::read_f32_into(bytes, &mut values);
            Block::F32(Grid::from_fn(rows, cols, |r, c| values[r * cols + c]))
        }
        DType::Bool => Block::Bool(Grid::from_fn(rows, cols, |r, c| bytes[r * cols + c] != 0)),
    }
}
