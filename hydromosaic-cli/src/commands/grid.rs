//! Grid command - show how input tiles are assembled and where they overlap.

use clap::Args;
use hydromosaic::grid::{Direction, GlobalGrid, OverlapGeometry};
use hydromosaic::index::TileIndex;
use hydromosaic::raster::GeoTiffSource;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::common::{index_tiles, resolve_input};
use crate::error::CliError;
use crate::runner::load_config;

/// Arguments for the grid command.
#[derive(Debug, Args)]
pub struct GridArgs {
    /// Directory with elevation tiles (overrides [input] directory)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Decimals used to group tile corners into rows and columns
    #[arg(long)]
    pub round_decimals: Option<u32>,
}

/// Print the assembled grid.
pub fn run(args: GridArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let input = resolve_input(args.input, &config)?;
    let decimals = args.round_decimals.unwrap_or(config.grid.round_decimals);

    let source = GeoTiffSource::new();
    let index = index_tiles(&input, &source)?;
    let grid = GlobalGrid::assemble(&index, decimals)?;
    let overlaps = OverlapGeometry::compute(&index, &grid)?;

    print!("{}", render(&index, &grid, &overlaps));
    Ok(())
}

/// Grid layout followed by one line per tile.
///
/// Overlaps are shown as `own/neighbor` pixel widths.
pub fn render(index: &TileIndex, grid: &GlobalGrid, overlaps: &OverlapGeometry) -> String {
    let (rows, cols) = grid.shape();
    let (mosaic_rows, mosaic_cols) = grid.mosaic_shape();
    let (chunk_rows, chunk_cols) = grid.chunk_shape();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Grid {} x {} ({} tiles), mosaic {} x {}, chunks {} x {}",
        rows,
        cols,
        grid.n_tiles(),
        mosaic_rows,
        mosaic_cols,
        chunk_rows,
        chunk_cols
    );
    let _ = writeln!(out);
    let _ = write!(out, "{}", grid);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>4}  {:<9} {:<20} {:>7} {:>7} {:>7} {:>7}  file",
        "tile", "cell", "slice", "left", "right", "top", "bottom"
    );
    for (tile, entry) in index.iter().enumerate() {
        let position = grid.position(tile);
        let widths: Vec<String> = Direction::ALL
            .iter()
            .map(|&dir| {
                let o = overlaps.overlap(tile, dir);
                format!("{}/{}", o.own, o.neighbor)
            })
            .collect();
        let _ = writeln!(
            out,
            "{:>4}  {:<9} {:<20} {:>7} {:>7} {:>7} {:>7}  {}",
            tile,
            format!("({}, {})", position.row, position.col),
            grid.slice(tile).to_string(),
            widths[0],
            widths[1],
            widths[2],
            widths[3],
            entry.path.display()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydromosaic::grid::DEFAULT_ROUND_DECIMALS;
    use hydromosaic::index::Tile;
    use hydromosaic::raster::{RasterMeta, Resolution};

    #[test]
    fn test_render_two_tiles() {
        let index = TileIndex::from_tiles(vec![
            Tile::new(
                "west.tif",
                RasterMeta::from_origin(0.0, 10.0, Resolution::new(0.1, -0.1), 10, 10),
            ),
            Tile::new(
                "east.tif",
                RasterMeta::from_origin(0.9, 10.0, Resolution::new(0.1, -0.1), 10, 10),
            ),
        ]);
        let grid = GlobalGrid::assemble(&index, DEFAULT_ROUND_DECIMALS).unwrap();
        let overlaps = OverlapGeometry::compute(&index, &grid).unwrap();

        let text = render(&index, &grid, &overlaps);
        assert!(text.starts_with("Grid 1 x 2 (2 tiles), mosaic 10 x 20, chunks 10 x 10"));
        assert!(text.contains("0 1\n"));
        let west = text.lines().find(|l| l.ends_with("west.tif")).unwrap();
        assert!(west.contains("0/0"));
        assert!(west.contains("1/1"));
    }
}
