//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Where elevation tiles are discovered
    pub input: InputSettings,
    /// Where derived layers are stored
    pub output: OutputSettings,
    /// Grid assembly settings
    pub grid: GridSettings,
    /// Worker pool settings
    pub workers: WorkerSettings,
    /// Edge convergence loop settings
    pub scheduler: SchedulerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Input configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSettings {
    /// Directory scanned for elevation files; must be given on the command
    /// line when unset
    pub directory: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// Root of the chunked output store
    pub path: PathBuf,
    /// Store backend
    pub format: StoreFormat,
}

/// Chunked store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    /// One directory per array on disk
    Directory,
    /// Process memory only; nothing survives the run
    Memory,
}

impl FromStr for StoreFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "directory" => Ok(StoreFormat::Directory),
            "memory" => Ok(StoreFormat::Memory),
            other => Err(format!("unknown store format '{}'", other)),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreFormat::Directory => write!(f, "directory"),
            StoreFormat::Memory => write!(f, "memory"),
        }
    }
}

/// Grid assembly configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSettings {
    /// Decimals tile corners are rounded to before clustering into rows
    /// and columns
    pub round_decimals: u32,
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// Number of worker threads. 1 runs edge corrections serially.
    pub count: usize,
}

/// Edge convergence configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    /// Longest single wait for a correction to complete, in milliseconds
    pub poll_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name inside `directory`
    pub file: String,
}
