// ABOUTME: Entry point for the cutover CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use cutover::config::{self, DeploymentConfig};
use cutover::error::Result;
use cutover::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Init { domain, force } => {
            config::init_config(&cwd, domain.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy { version } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::deploy(config, &version, output).await
        }
        Commands::Status => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::status(config, output).await
        }
        Commands::Rollback => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::rollback(config, output).await
        }
    }
}

fn load_config(path: Option<&std::path::Path>, cwd: &std::path::Path) -> Result<DeploymentConfig> {
    match path {
        Some(path) => DeploymentConfig::load(path),
        None => DeploymentConfig::discover(cwd),
    }
}
