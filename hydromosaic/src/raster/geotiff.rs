//! GeoTIFF raster source.
//!
//! Reads the georeferencing from the ModelPixelScale (tag 33550) and
//! ModelTiepoint (tag 33922) tags using the pure Rust `tiff` crate.

use super::source::{RasterError, RasterSource};
use super::types::{Grid, RasterMeta, Resolution};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;

/// Raster source for north-up GeoTIFF files in geographic coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffSource;

impl GeoTiffSource {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<Decoder<File>, RasterError> {
        if !is_tiff(path) {
            return Err(RasterError::Unsupported(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| RasterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Decoder::new(file).map_err(|e| tiff_error(path, e))
    }
}

impl RasterSource for GeoTiffSource {
    fn supports(&self, path: &Path) -> bool {
        is_tiff(path)
    }

    fn metadata(&self, path: &Path) -> Result<RasterMeta, RasterError> {
        let mut decoder = Self::open(path)?;
        let (width, height) = decoder.dimensions().map_err(|e| tiff_error(path, e))?;

        let scale = decoder
            .get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE_TAG))
            .map_err(|_| missing(path, "no ModelPixelScale tag"))?;
        let tiepoint = decoder
            .get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT_TAG))
            .map_err(|_| missing(path, "no ModelTiepoint tag"))?;

        // ModelTiepoint: [I, J, K, X, Y, Z]; ModelPixelScale: [ScaleX, ScaleY, ScaleZ]
        if tiepoint.len() < 6 || scale.len() < 2 {
            return Err(missing(path, "truncated geotransform tags"));
        }
        let left = tiepoint[3] - tiepoint[0] * scale[0];
        let top = tiepoint[4] + tiepoint[1] * scale[1];
        let resolution = Resolution::new(scale[0], -scale[1]);

        Ok(RasterMeta::from_origin(
            left,
            top,
            resolution,
            height as usize,
            width as usize,
        ))
    }

    fn read_elevation(&self, path: &Path) -> Result<Grid<f32>, RasterError> {
        let mut decoder = Self::open(path)?;
        let (width, height) = decoder.dimensions().map_err(|e| tiff_error(path, e))?;
        let values: Vec<f32> = match decoder.read_image().map_err(|e| tiff_error(path, e))? {
            DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        };
        Grid::from_vec(height as usize, width as usize, values).map_err(|e| RasterError::Tiff {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
        .unwrap_or(false)
}

fn tiff_error(path: &Path, err: tiff::TiffError) -> RasterError {
    RasterError::Tiff {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn missing(path: &Path, reason: &str) -> RasterError {
    RasterError::MissingGeotransform {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_tiff_extension() {
        let err = GeoTiffSource::new()
            .metadata(Path::new("tile.hgt"))
            .unwrap_err();
        assert!(matches!(err, RasterError::Unsupported(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GeoTiffSource::new()
            .metadata(Path::new("/nonexistent/dir/tile.tif"))
            .unwrap_err();
        assert!(matches!(err, RasterError::Io { .. }));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(is_tiff(Path::new("N45W120.TIF")));
        assert!(is_tiff(Path::new("a/b/c.tiff")));
        assert!(!is_tiff(Path::new("c.vrt")));
    }

    #[test]
    fn test_supports_only_tiff() {
        let source = GeoTiffSource::new();
        assert!(source.supports(Path::new("n45w120.tif")));
        assert!(!source.supports(Path::new("n45w120.hgt")));
        assert!(!source.supports(Path::new("n45w120")));
    }
}
