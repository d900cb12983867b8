//! Write-then-verify protocol for shared arrays.
//!
//! Tiles overlap, so two workers may write into the same chunk at the same
//! time and one may silently undo the other's update. Every write is
//! therefore read back and compared; on a mismatch the block is written
//! again, up to [`MAX_WRITE_RETRIES`] extra times.

use super::block::Block;
use super::error::WriteError;
use super::r#trait::ChunkedStore;
use crate::grid::Region;
use crate::log::Logger;
use crate::log_debug;
use crate::raster::Grid;

/// Extra writes allowed after the first attempt.
pub const MAX_WRITE_RETRIES: usize = 5;

/// Absolute tolerance when comparing float values read back.
pub const FLOAT_TOLERANCE: f64 = 1e-8;

/// Write `block` into `region` and verify it reads back unchanged.
///
/// Returns the number of write attempts used. A failed write or a failed
/// verification read counts as a mismatch. After `1 + MAX_WRITE_RETRIES`
/// unsuccessful attempts the accumulated diagnostics are returned as
/// [`WriteError::Inconsistent`]. Each failed attempt is logged at debug
/// level.
pub fn write_verified(
    store: &dyn ChunkedStore,
    logger: &dyn Logger,
    name: &str,
    region: &Region,
    block: &Block,
) -> Result<usize, WriteError> {
    let max_attempts = MAX_WRITE_RETRIES + 1;
    let mut diagnostics = Vec::new();

    for attempt in 1..=max_attempts {
        let problem = match store.write(name, region, block) {
            Err(e) => Some(format!("attempt {}: write failed: {}", attempt, e)),
            Ok(()) => match store.read(name, region) {
                Err(e) => Some(format!("attempt {}: verify read failed: {}", attempt, e)),
                Ok(actual) => {
                    describe_mismatch(block, &actual).map(|d| format!("attempt {}: {}", attempt, d))
                }
            },
        };

        match problem {
            None => return Ok(attempt),
            Some(problem) => {
                log_debug!(logger, "{} {}: {}", name, region, problem);
                diagnostics.push(problem);
            }
        }
    }

    Err(WriteError::Inconsistent {
        array: name.to_string(),
        attempts: max_attempts,
        diagnostics,
    })
}

/// Describe how `actual` differs from `expected`, or `None` when they match.
pub fn describe_mismatch(expected: &Block, actual: &Block) -> Option<String> {
    if expected.shape() != actual.shape() {
        return Some(format!(
            "read back shape {:?}, expected {:?}",
            actual.shape(),
            expected.shape()
        ));
    }
    match (expected, actual) {
        (Block::F32(e), Block::F32(a)) => compare(e, a, floats_match, |v| format!("{}", v)),
        (Block::Bool(e), Block::Bool(a)) => compare(e, a, |x, y| x == y, |v| format!("{}", v)),
        _ => Some(format!(
            "read back {} values, expected {}",
            actual.dtype(),
            expected.dtype()
        )),
    }
}

fn floats_match(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || ((a as f64) - (b as f64)).abs() <= FLOAT_TOLERANCE
}

fn compare<T: Copy>(
    expected: &Grid<T>,
    actual: &Grid<T>,
    eq: impl Fn(T, T) -> bool,
    show: impl Fn(T) -> String,
) -> Option<String> {
    let mut first = None;
    let mut count = 0usize;
    for r in 0..expected.rows() {
        for c in 0..expected.cols() {
            let (e, a) = (expected.get(r, c), actual.get(r, c));
            if !eq(e, a) {
                count += 1;
                first.get_or_insert((r, c, e, a));
            }
        }
    }
    first.map(|(r, c, e, a)| {
        format!(
            "{} of {} values differ, first at ({}, {}): wrote {}, read {}",
            count,
            expected.len(),
            r,
            c,
            show(e),
            show(a)
        )
    })
}
