//! CLI module for OptiEngine
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `check-config`: load and validate configuration, then print the calibration

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// OptiEngine - tiered semantic cache for code optimization
#[derive(Parser)]
#[command(name = "optiengine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Validate configuration and print the resolved calibration
    CheckConfig,
}
