//! Chunked array storage shared by all workers.
//!
//! Every stage exchanges data only through named mosaic-sized arrays in a
//! [`ChunkedStore`]. Two backends ship with the crate:
//!
//! - [`MemoryStore`]: dense in-memory arrays
//! - [`DirectoryStore`]: one directory per array with little-endian chunk
//!   files, so an interrupted run can resume
//!
//! Workers write through [`write_verified`], which re-reads each region and
//! retries when a concurrent writer clobbered it.

mod block;
mod directory;
mod error;
mod memory;
pub mod names;
mod resilient;
mod r#trait;

pub use block::{Block, DType};
pub use directory::DirectoryStore;
pub use error::{StoreError, WriteError};
pub use memory::MemoryStore;
pub use r#trait::{ArraySpec, ChunkedStore};
pub use resilient::{describe_mismatch, write_verified, FLOAT_TOLERANCE, MAX_WRITE_RETRIES};
