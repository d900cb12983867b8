//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use hydromosaic::config::ConfigFileError;
use hydromosaic::grid::GridError;
use hydromosaic::index::IndexError;
use hydromosaic::pipeline::PipelineError;
use hydromosaic::store::StoreError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// No input directory on the command line or in config.ini
    MissingInput,
    /// Input tiles could not be indexed
    Index(IndexError),
    /// Input tiles do not form a grid
    Grid(GridError),
    /// Output store could not be opened
    Store(StoreError),
    /// The pipeline stopped
    Pipeline(PipelineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::MissingInput => {
                eprintln!();
                eprintln!("Pass --input <DIR> or set it in config.ini:");
                eprintln!("  [input]");
                eprintln!("  directory = /path/to/elevation/tiles");
            }
            CliError::Grid(_) | CliError::Pipeline(PipelineError::Grid(_)) => {
                eprintln!();
                eprintln!("Tiles in the same grid row must have the same number of rows,");
                eprintln!("and tiles in the same grid column the same number of columns.");
                eprintln!("Run 'hydromosaic grid' to inspect how the inputs were grouped.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::MissingInput => write!(f, "No input directory given"),
            CliError::Index(e) => write!(f, "Failed to read input tiles: {}", e),
            CliError::Grid(e) => write!(f, "Invalid tile grid: {}", e),
            CliError::Store(e) => write!(f, "Failed to open output store: {}", e),
            CliError::Pipeline(e) => write!(f, "Pipeline failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Index(e) => Some(e),
            CliError::Grid(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<IndexError> for CliError {
    fn from(e: IndexError) -> Self {
        CliError::Index(e)
    }
}

impl From<GridError> for CliError {
    fn from(e: GridError) -> Self {
        CliError::Grid(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}
