//! Run command - the full pipeline over a directory of tiles.

use clap::Args;
use hydromosaic::config::{ConfigFile, StoreFormat};
use hydromosaic::log::{Logger, TracingLogger};
use hydromosaic::pipeline::{Pipeline, PipelineOptions};
use hydromosaic::raster::GeoTiffSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::common::{index_tiles, open_store, resolve_input, StoreKind};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory with elevation tiles (overrides [input] directory)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output store path (overrides [output] path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output store backend (overrides [output] format)
    #[arg(long, value_enum)]
    pub format: Option<StoreKind>,

    /// Worker threads; 1 runs edge corrections serially
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Decimals used to group tile corners into rows and columns
    #[arg(long)]
    pub round_decimals: Option<u32>,

    /// Longest single wait for an edge correction, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

/// Everything a run needs once CLI flags and config are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: StoreFormat,
    pub options: PipelineOptions,
}

impl RunPlan {
    /// Merge flags over config values.
    pub fn resolve(args: RunArgs, config: &ConfigFile) -> Result<Self, CliError> {
        let input = resolve_input(args.input, config)?;
        let mut options = PipelineOptions::from(config);
        if let Some(workers) = args.workers {
            options = options.with_workers(workers);
        }
        if let Some(decimals) = args.round_decimals {
            options = options.with_round_decimals(decimals);
        }
        if let Some(ms) = args.poll_interval_ms {
            options = options.with_poll_interval(Duration::from_millis(ms.max(1)));
        }

        Ok(Self {
            input,
            output: args.output.unwrap_or_else(|| config.output.path.clone()),
            format: args.format.map(StoreFormat::from).unwrap_or(config.output.format),
            options,
        })
    }
}

/// Run the pipeline.
pub fn run(args: RunArgs, config_path: Option<&Path>, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, verbose)?;
    runner.log_startup("run");
    let plan = RunPlan::resolve(args, runner.config())?;

    info!(
        "Input {}, output {} ({}), {} workers",
        plan.input.display(),
        plan.output.display(),
        plan.format,
        plan.options.workers
    );

    let source = Arc::new(GeoTiffSource::new());
    let index = index_tiles(&plan.input, source.as_ref())?;
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let store = open_store(plan.format, &plan.output, Arc::clone(&logger))?;

    let mut pipeline = Pipeline::new(index, source, store, logger, plan.options);
    let summary = pipeline.process_all()?;

    println!();
    println!("{}", summary);
    if plan.format == StoreFormat::Directory {
        println!("Results written to {}", plan.output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            input: Some(PathBuf::from("/dem")),
            output: None,
            format: None,
            workers: None,
            round_decimals: None,
            poll_interval_ms: None,
        }
    }

    #[test]
    fn test_config_values_used_by_default() {
        let mut config = ConfigFile::default();
        config.output.path = PathBuf::from("/scratch/out");
        config.workers.count = 5;

        let plan = RunPlan::resolve(args(), &config).unwrap();
        assert_eq!(plan.input, PathBuf::from("/dem"));
        assert_eq!(plan.output, PathBuf::from("/scratch/out"));
        assert_eq!(plan.format, StoreFormat::Directory);
        assert_eq!(plan.options.workers, 5);
    }

    #[test]
    fn test_flags_override_config() {
        let mut args = args();
        args.format = Some(StoreKind::Memory);
        args.workers = Some(1);
        args.round_decimals = Some(3);
        args.poll_interval_ms = Some(10);

        let plan = RunPlan::resolve(args, &ConfigFile::default()).unwrap();
        assert_eq!(plan.format, StoreFormat::Memory);
        assert_eq!(plan.options.workers, 1);
        assert_eq!(plan.options.round_decimals, 3);
        assert_eq!(plan.options.poll_interval, Duration::from_millis(10));
    }
}
