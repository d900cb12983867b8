//! Configuration for hydromosaic runs.
//!
//! Settings are read from `~/.hydromosaic/config.ini` (or an explicit path)
//! and overlaid on built-in defaults. Command-line flags override both.
//!
//! # Example
//!
//! ```
//! use hydromosaic::config::{ConfigFile, StoreFormat};
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.grid.round_decimals, 2);
//! assert_eq!(config.output.format, StoreFormat::Directory);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, GridSettings, InputSettings, LoggingSettings, OutputSettings, SchedulerSettings,
    StoreFormat, WorkerSettings,
};
