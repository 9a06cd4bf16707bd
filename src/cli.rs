// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cutover")]
#[command(about = "Blue-green deployments with health-gated traffic cutover")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (default: discover in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cutover.yml configuration file
    Init {
        /// Base domain the environments are served under
        #[arg(short, long)]
        domain: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy a version to the inactive environment and switch traffic to it
    Deploy {
        /// Version identifier handed to the push command
        version: String,
    },

    /// Show which environment is serving traffic
    Status,

    /// Point traffic back at the other environment
    Rollback,
}
