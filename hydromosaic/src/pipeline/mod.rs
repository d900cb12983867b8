//! End-to-end driver: grid, per-tile stages and edge convergence.
//!
//! [`Pipeline::process_all`] runs
//!
//! 1. **Compute Grid**: assemble the tile grid and open the output arrays
//! 2. **Compute Elevation**: condition raw elevation per tile
//! 3. **Compute Aspect and Slope**
//! 4. **Compute UCA**: tile-local upstream area; overlap geometry is
//!    resolved while these tasks run
//! 5. **Compute UCA Corrections**: the edge convergence loop
//!
//! Every stage records per-tile success in the store, so running the same
//! pipeline against the same store again only redoes what failed.

mod driver;
mod error;
mod options;

pub use driver::{Pipeline, PipelineSummary};
pub use error::PipelineError;
pub use options::PipelineOptions;

#[cfg(test)]
mod tests;
