//! Integration tests for the tiled processing pipeline.
//!
//! These tests drive the full flow through the public API:
//! - Grid assembly and per-tile stages on an in-memory mosaic
//! - Missing tiles leaving holes in the grid
//! - Boundary correction in serial and parallel modes
//! - Resuming a run from a persisted store

use std::sync::Arc;
use std::time::Duration;

use hydromosaic::grid::{Direction, EdgeOverlap, Region};
use hydromosaic::index::{Tile, TileIndex};
use hydromosaic::log::NoOpLogger;
use hydromosaic::pipeline::{Pipeline, PipelineOptions};
use hydromosaic::raster::{Grid, MemoryRasterSource, RasterMeta, Resolution};
use hydromosaic::stage::Stage;
use hydromosaic::store::{names, ChunkedStore, DirectoryStore, MemoryStore};

// =============================================================================
// Test Helpers
// =============================================================================

const RES: f64 = 0.01;

/// A `rows` x `cols` mosaic of `size`-pixel tiles sharing one pixel with
/// each neighbor. Positions listed in `holes` get no tile.
fn mosaic(
    rows: usize,
    cols: usize,
    size: usize,
    holes: &[(usize, usize)],
    z: impl Fn(usize, usize) -> f32,
) -> (TileIndex, Arc<MemoryRasterSource>) {
    let step = size - 1;
    let source = MemoryRasterSource::new();
    let mut tiles = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if holes.contains(&(r, c)) {
                continue;
            }
            let path = format!("tile_r{}_c{}.tif", r, c);
            let meta = RasterMeta::from_origin(
                (c * step) as f64 * RES,
                45.0 - (r * step) as f64 * RES,
                Resolution::new(RES, -RES),
                size,
                size,
            );
            let (r0, c0) = (r * step, c * step);
            source.insert(
                path.clone(),
                meta,
                Grid::from_fn(size, size, |i, j| z(r0 + i, c0 + j)),
            );
            tiles.push(Tile::new(path, meta));
        }
    }
    (TileIndex::from_tiles(tiles), Arc::new(source))
}

/// Terrain falling towards the south-east corner of the mosaic.
fn diagonal_plane(r: usize, c: usize) -> f32 {
    1000.0 - r as f32 - c as f32
}

fn options(workers: usize) -> PipelineOptions {
    PipelineOptions::default()
        .with_workers(workers)
        .with_poll_interval(Duration::from_millis(5))
}

fn build(
    index: TileIndex,
    source: Arc<MemoryRasterSource>,
    store: Arc<dyn ChunkedStore>,
    workers: usize,
) -> Pipeline {
    Pipeline::new(index, source, store, Arc::new(NoOpLogger), options(workers))
}

fn read_f32(store: &dyn ChunkedStore, name: &str) -> Vec<f32> {
    let shape = store.shape(name).unwrap();
    store
        .read(name, &Region::full(shape))
        .unwrap()
        .into_f32()
        .unwrap()
        .into_vec()
}

fn read_bool(store: &dyn ChunkedStore, name: &str) -> Vec<bool> {
    let shape = store.shape(name).unwrap();
    store
        .read(name, &Region::full(shape))
        .unwrap()
        .into_bool()
        .unwrap()
        .into_vec()
}

/// Bit patterns, so NaN cells compare equal to each other.
fn bits(values: &[f32]) -> Vec<u32> {
    values.iter().map(|v| v.to_bits()).collect()
}

fn finite_max(values: &[f32]) -> f32 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::MIN, f32::max)
}

// =============================================================================
// Stages
// =============================================================================

#[test]
fn test_two_by_two_elevation_succeeds_everywhere() {
    let (index, source) = mosaic(2, 2, 8, &[], diagonal_plane);
    let store = Arc::new(MemoryStore::new());
    let mut pipeline = build(index, source, store.clone(), 2);

    let report = pipeline.process_elevation().unwrap();

    assert_eq!(report.success, vec![true; 4]);
    let grid = pipeline.grid().unwrap();
    assert_eq!(grid.shape(), (2, 2));
    assert_eq!(grid.mosaic_shape(), (16, 16));
    assert_eq!(store.shape(names::ELEV).unwrap(), (16, 16));

    let elev = read_f32(store.as_ref(), names::ELEV);
    assert!(elev.iter().all(|v| v.is_finite()));
}

#[test]
fn test_corner_hole_gives_zero_overlap() {
    let (index, source) = mosaic(2, 2, 6, &[(1, 1)], diagonal_plane);
    let store = Arc::new(MemoryStore::new());
    let mut pipeline = build(index, source, store, 2);

    let summary = pipeline.process_all().unwrap();
    assert_eq!(summary.n_tiles, 3);
    assert_eq!(summary.succeeded, [3, 3, 3, 3]);

    let grid = pipeline.grid().unwrap();
    assert_eq!(grid.tile_at(1, 1), None);
    let top_right = grid.tile_at(0, 1).unwrap();
    let bottom_left = grid.tile_at(1, 0).unwrap();

    let overlaps = pipeline.overlaps().unwrap();
    assert_eq!(overlaps.overlap(top_right, Direction::Bottom), EdgeOverlap::NONE);
    assert_eq!(overlaps.overlap(bottom_left, Direction::Right), EdgeOverlap::NONE);
    assert!(!overlaps.overlap(top_right, Direction::Left).is_none());
}

// =============================================================================
// Boundary corrections
// =============================================================================

#[test]
fn test_single_tile_is_corrected_exactly_once() {
    for workers in [1, 3] {
        let (index, source) = mosaic(1, 1, 7, &[], diagonal_plane);
        let mut pipeline = build(index, source, Arc::new(MemoryStore::new()), workers);

        pipeline.process_elevation().unwrap();
        pipeline.process_aspect_slope().unwrap();
        pipeline.process_uca().unwrap();
        let report = pipeline.process_uca_edges().unwrap();

        assert_eq!(report.invocations(), 1, "workers = {}", workers);
        assert_eq!(report.latest, vec![Some(true)]);
        assert!(pipeline.success().get(0, Stage::UcaEdge));
    }
}

#[test]
fn test_corrections_carry_area_across_seams() {
    let (index, source) = mosaic(2, 2, 8, &[], diagonal_plane);
    let store = Arc::new(MemoryStore::new());
    let mut pipeline = build(index, source, store.clone(), 2);

    pipeline.process_elevation().unwrap();
    pipeline.process_aspect_slope().unwrap();
    pipeline.process_uca().unwrap();
    let local = finite_max(&read_f32(store.as_ref(), names::UCA));

    let report = pipeline.process_uca_edges().unwrap();
    assert!(report.invocations() >= 4);
    let corrected = finite_max(&read_f32(store.as_ref(), names::UCA));
    assert!(
        corrected > local,
        "expected inflow from upstream tiles: {} <= {}",
        corrected,
        local
    );
}

#[test]
fn test_serial_and_parallel_corrections_agree() {
    let run = |workers: usize| {
        let (index, source) = mosaic(2, 2, 8, &[], diagonal_plane);
        let store = Arc::new(MemoryStore::new());
        let mut pipeline = build(index, source, store.clone(), workers);
        let summary = pipeline.process_all().unwrap();
        (
            summary.pending,
            bits(&read_f32(store.as_ref(), names::UCA)),
            read_bool(store.as_ref(), names::EDGE_TODO),
            read_bool(store.as_ref(), names::EDGE_DONE),
        )
    };

    let serial = run(1);
    let parallel = run(4);

    assert_eq!(serial.0, parallel.0, "pending boundary cells differ");
    assert_eq!(serial.1, parallel.1, "uca differs");
    assert_eq!(serial.2, parallel.2, "edge_todo differs");
    assert_eq!(serial.3, parallel.3, "edge_done differs");
}

// =============================================================================
// Resume
// =============================================================================

#[test]
fn test_second_run_skips_finished_tiles() {
    let (index, source) = mosaic(2, 2, 6, &[], diagonal_plane);
    let store: Arc<dyn ChunkedStore> = Arc::new(MemoryStore::new());

    let mut first = build(index.clone(), source.clone(), Arc::clone(&store), 2);
    first.process_all().unwrap();

    let mut second = build(index, source, store, 2);
    second.compute_grid().unwrap();
    assert_eq!(second.success().count(Stage::Elevation), 4);

    let elevation = second.process_elevation().unwrap();
    assert_eq!(elevation.invocations(), 0);
    let uca = second.process_uca().unwrap();
    assert_eq!(uca.invocations(), 0);
    assert!(second.overlaps().is_some());
}

#[test]
fn test_directory_store_resumes_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (index, source) = mosaic(1, 2, 6, &[], diagonal_plane);

    {
        let store = Arc::new(DirectoryStore::new(dir.path()).unwrap());
        let mut pipeline = build(index.clone(), source.clone(), store, 1);
        let summary = pipeline.process_all().unwrap();
        assert_eq!(summary.succeeded, [2, 2, 2, 2]);
    }

    let store = Arc::new(DirectoryStore::new(dir.path()).unwrap());
    let mut pipeline = build(index, source, store.clone(), 1);
    let report = pipeline.process_aspect_slope().unwrap();
    assert_eq!(report.invocations(), 0);
    assert_eq!(pipeline.success().count(Stage::Uca), 2);
    assert_eq!(store.shape(names::UCA).unwrap(), (6, 12));
}
