//! Tests for the pipeline driver.

use super::*;
use crate::grid::GridError;
use crate::index::{Tile, TileIndex};
use crate::log::{CaptureLogger, LogLevel, NoOpLogger};
use crate::raster::{Bounds, Grid, MemoryRasterSource, RasterMeta, Resolution};
use crate::stage::Stage;
use crate::store::{ChunkedStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;

/// `rows` x `cols` tiles of `size` pixels sharing one pixel with each
/// neighbor, sampled from `z(global_row, global_col)`.
fn mosaic(
    rows: usize,
    cols: usize,
    size: usize,
    z: impl Fn(usize, usize) -> f32,
) -> (TileIndex, Arc<MemoryRasterSource>) {
    let res = 0.01;
    let step = size - 1;
    let source = MemoryRasterSource::new();
    let mut tiles = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let path = format!("n{}_e{}.tif", r, c);
            let meta = RasterMeta::from_origin(
                (c * step) as f64 * res,
                45.0 - (r * step) as f64 * res,
                Resolution::new(res, -res),
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

fn pipeline(
    index: TileIndex,
    source: Arc<MemoryRasterSource>,
    workers: usize,
) -> (Pipeline, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let options = PipelineOptions::default()
        .with_workers(workers)
        .with_poll_interval(Duration::from_millis(5));
    let pipeline = Pipeline::new(index, source, store.clone(), Arc::new(NoOpLogger), options);
    (pipeline, store)
}

fn plane(r: usize, c: usize) -> f32 {
    500.0 - r as f32 - 2.0 * c as f32
}

#[test]
fn test_process_all_logs_stages_in_order() {
    let (index, source) = mosaic(2, 2, 6, plane);
    let logger = Arc::new(CaptureLogger::new());
    let mut pipeline = Pipeline::new(
        index,
        source,
        Arc::new(MemoryStore::new()),
        logger.clone(),
        PipelineOptions::default().with_workers(2),
    );
    pipeline.process_all().unwrap();

    let stages: Vec<String> = logger
        .messages_at(LogLevel::Info)
        .into_iter()
        .filter(|m| m.starts_with("Compute "))
        .collect();
    assert_eq!(
        stages,
        vec![
            "Compute Grid",
            "Compute Elevation",
            "Compute Aspect and Slope",
            "Compute UCA",
            "Compute UCA Corrections",
        ]
    );
}

#[test]
fn test_process_all_succeeds_on_clean_mosaic() {
    let (index, source) = mosaic(2, 2, 6, plane);
    let (mut pipeline, _store) = pipeline(index, source, 2);

    let summary = pipeline.process_all().unwrap();
    assert_eq!(summary.n_tiles, 4);
    assert_eq!(summary.mosaic_shape, (12, 12));
    assert_eq!(summary.succeeded, [4, 4, 4, 4]);
    assert!(pipeline.overlaps().is_some());
    assert!(summary.to_string().contains("4 tiles, mosaic 12 x 12"));
}

#[test]
fn test_stage_methods_assemble_on_demand() {
    let (index, source) = mosaic(1, 2, 5, plane);
    let (mut pipeline, _store) = pipeline(index, source, 1);

    assert!(pipeline.grid().is_none());
    let report = pipeline.process_elevation().unwrap();
    assert_eq!(report.success, vec![true, true]);
    assert_eq!(pipeline.grid().map(|g| g.shape()), Some((1, 2)));
}

#[test]
fn test_missing_raster_fails_only_its_tile() {
    let (index, _) = mosaic(1, 2, 5, plane);
    let source = MemoryRasterSource::new();
    let tile = &index[0];
    source.insert(
        tile.path.clone(),
        RasterMeta::from_origin(0.0, 45.0, Resolution::new(0.01, -0.01), 5, 5),
        Grid::from_fn(5, 5, plane),
    );
    let (mut pipeline, _store) = pipeline(index, Arc::new(source), 2);

    let report = pipeline.process_elevation().unwrap();
    assert_eq!(report.success, vec![true, false]);
    assert_eq!(report.failures(), 1);
    assert!(!pipeline.success().get(1, Stage::Elevation));
}

#[test]
fn test_inconsistent_grid_is_fatal() {
    let source = Arc::new(MemoryRasterSource::new());
    let tiles = vec![
        Tile::new(
            "a.tif",
            RasterMeta::from_origin(0.0, 45.0, Resolution::new(0.01, -0.01), 5, 5),
        ),
        Tile::new(
            "b.tif",
            RasterMeta::from_origin(0.04, 45.0, Resolution::new(0.01, -0.01), 6, 5),
        ),
    ];
    let (mut pipeline, _store) = pipeline(TileIndex::from_tiles(tiles), source, 1);

    match pipeline.process_all() {
        Err(PipelineError::Grid(GridError::InconsistentRowSize { .. })) => {}
        other => panic!("expected inconsistent row size, got {:?}", other.map(|s| s.n_tiles)),
    }
}

#[test]
fn test_success_table_is_persisted() {
    let (index, source) = mosaic(1, 2, 5, plane);
    let (mut pipeline, store) = pipeline(index, source, 2);
    pipeline.process_all().unwrap();

    let stored = crate::stage::SuccessTable::load(store.as_ref(), 2).unwrap();
    assert_eq!(&stored, pipeline.success());
    assert!(store.contains(crate::store::names::UCA_EDGE_METRICS));
}

#[test]
fn test_uca_results_are_recorded_when_overlaps_fail() {
    // Bounds claim far more coverage than the pixel count allows, so the
    // edge references of the pair fall outside the mosaic
    let res = Resolution::new(0.1, -0.1);
    let wide = RasterMeta {
        bounds: Bounds::new(0.0, 0.0, 5.0, 1.0),
        resolution: res,
        rows: 10,
        cols: 2,
    };
    let narrow = RasterMeta::from_origin(1.0, 1.0, res, 10, 2);
    let source = MemoryRasterSource::new();
    source.insert("a.tif", wide, Grid::from_fn(10, 2, plane));
    source.insert("b.tif", narrow, Grid::from_fn(10, 2, plane));
    let index = TileIndex::from_tiles(vec![Tile::new("a.tif", wide), Tile::new("b.tif", narrow)]);
    let (mut pipeline, store) = pipeline(index, Arc::new(source), 2);

    pipeline.process_elevation().unwrap();
    pipeline.process_aspect_slope().unwrap();
    match pipeline.process_uca() {
        Err(PipelineError::Grid(GridError::ReferenceOutOfBounds { .. })) => {}
        other => panic!("expected out of bounds reference, got {:?}", other.map(|r| r.success)),
    }

    assert_eq!(pipeline.success().count(Stage::Uca), 2);
    assert!(pipeline.overlaps().is_none());
    let stored = crate::stage::SuccessTable::load(store.as_ref(), 2).unwrap();
    assert_eq!(&stored, pipeline.success());
}
