//! Names and layouts of the pipeline's stored arrays.

use super::block::DType;
use super::r#trait::ArraySpec;

/// Conditioned elevation
pub const ELEV: &str = "elev";
/// D8 flow direction angle
pub const ASPECT: &str = "aspect";
/// D8 slope magnitude
pub const SLOPE: &str = "slope";
/// Upstream contributing area
pub const UCA: &str = "uca";
/// Boundary cells whose value is final
pub const EDGE_DONE: &str = "edge_done";
/// Boundary cells still waiting on a neighbor
pub const EDGE_TODO: &str = "edge_todo";
/// Per-tile stage success flags
pub const SUCCESS: &str = "success";
/// Per-tile edge metric (fraction, resolvable count)
pub const UCA_EDGE_METRICS: &str = "uca_edge_metrics";

/// Mosaic-sized float layers.
pub const FLOAT_LAYERS: [&str; 4] = [ELEV, ASPECT, SLOPE, UCA];

/// Mosaic-sized boolean layers.
pub const EDGE_LAYERS: [&str; 2] = [EDGE_DONE, EDGE_TODO];

/// Specs of every array a run uses.
///
/// `mosaic` and `chunks` come from the global grid; the per-tile tables
/// are stored as single chunks.
pub fn pipeline_arrays(
    mosaic: (usize, usize),
    chunks: (usize, usize),
    n_tiles: usize,
    n_stages: usize,
) -> Vec<ArraySpec> {
    let mut specs: Vec<ArraySpec> = FLOAT_LAYERS
        .iter()
        .map(|name| ArraySpec::new(*name, mosaic, chunks, DType::F32))
        .collect();
    specs.extend(
        EDGE_LAYERS
            .iter()
            .map(|name| ArraySpec::new(*name, mosaic, chunks, DType::Bool)),
    );
    specs.push(ArraySpec::new(
        SUCCESS,
        (n_tiles, n_stages),
        (n_tiles, n_stages),
        DType::Bool,
    ));
    specs.push(ArraySpec::new(
        UCA_EDGE_METRICS,
        (n_tiles, 2),
        (n_tiles, 2),
        DType::F32,
    ));
    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_arrays() {
        let specs = pipeline_arrays((20, 30), (10, 10), 6, 4);
        assert_eq!(specs.len(), 8);
        let success = specs.iter().find(|s| s.name == SUCCESS).unwrap();
        assert_eq!(success.shape, (6, 4));
        assert_eq!(success.dtype, DType::Bool);
        let todo = specs.iter().find(|s| s.name == EDGE_TODO).unwrap();
        assert_eq!(todo.shape, (20, 30));
        assert_eq!(todo.chunks, (10, 10));
    }
}
