//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

/// Get the number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Default output store directory, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "hydromosaic_out";

/// Default coordinate rounding for grid clustering.
pub const DEFAULT_ROUND_DECIMALS: u32 = crate::grid::DEFAULT_ROUND_DECIMALS;

/// Default completion wait in the edge convergence loop.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "hydromosaic.log";

/// Default log directory (~/.hydromosaic/logs).
pub fn default_log_directory() -> PathBuf {
    config_directory().join("logs")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            input: InputSettings { directory: None },
            output: OutputSettings {
                path: PathBuf::from(DEFAULT_OUTPUT_PATH),
                format: StoreFormat::Directory,
            },
            grid: GridSettings {
                round_decimals: DEFAULT_ROUND_DECIMALS,
            },
            workers: WorkerSettings { count: num_cpus() },
            scheduler: SchedulerSettings {
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            },
            logging: LoggingSettings {
                directory: default_log_directory(),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
