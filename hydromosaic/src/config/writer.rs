//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let input_directory = config
        .input
        .directory
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[input]
; Directory scanned for elevation tiles (tif, tiff, vrt, hgt, flt, adf, grib)
; May be left empty and given on the command line instead
directory = {}

[output]
; Root of the chunked output store (default: hydromosaic_out)
path = {}
; Store backend:
;   directory - one directory per array, resumable across runs
;   memory    - in-process only, for dry runs
format = {}

[grid]
; Decimals tile corners are rounded to when grouping tiles into rows and
; columns (default: 2)
round_decimals = {}

[workers]
; Number of worker threads (default: number of CPU cores)
; 1 runs the edge correction loop serially on the main thread
count = {}

[scheduler]
; Longest single wait for an edge correction to finish, in milliseconds
; (default: 50)
poll_interval_ms = {}

[logging]
; Log directory (default: ~/.hydromosaic/logs)
directory = {}
; Log file name, cleared at the start of every run (default: hydromosaic.log)
file = {}
"#,
        input_directory,
        path_to_string(&config.output.path),
        config.output.format,
        config.grid.round_decimals,
        config.workers.count,
        config.scheduler.poll_interval_ms,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
