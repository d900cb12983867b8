//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, path, show)
//! - [`grid`] - Print the assembled tile grid and overlaps
//! - [`run`] - Run the full pipeline

pub mod common;
pub mod config;
pub mod grid;
pub mod run;
