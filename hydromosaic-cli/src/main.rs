//! hydromosaic CLI - Command-line interface
//!
//! This binary drives the hydromosaic pipeline over a directory of
//! elevation tiles.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::config::ConfigCommands;
use commands::grid::GridArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "hydromosaic")]
#[command(version = hydromosaic::VERSION)]
#[command(about = "Tiled elevation mosaics with cross-tile upstream area", long_about = None)]
struct Cli {
    /// Config file (default: ~/.hydromosaic/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage: grid, elevation, slope/aspect, UCA, edge corrections
    Run(RunArgs),

    /// Print the assembled tile grid and overlaps
    Grid(GridArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, config_path, cli.verbose),
        Commands::Grid(args) => commands::grid::run(args, config_path),
        Commands::Config { command } => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "hydromosaic",
            "run",
            "--input",
            "/dem",
            "--workers",
            "1",
            "--format",
            "memory",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.input, Some(PathBuf::from("/dem")));
                assert_eq!(args.workers, Some(1));
                assert_eq!(args.format, Some(commands::common::StoreKind::Memory));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let args = ["hydromosaic", "--config", "/tmp/h.ini", "config", "init", "--force"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/h.ini")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Init { force: true }
            }
        ));
    }
}
