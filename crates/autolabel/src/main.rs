//! Autolabel CLI - auto-label images with an open-vocabulary detector.
//!
//! Autolabel builds a caption from a class list, sends each image to a
//! detector, and turns the returned boxes and phrase scores into labeled
//! samples and a COCO detection dataset.
//!
//! # Usage
//!
//! ```bash
//! # Label the configured image directory and export COCO
//! autolabel run
//!
//! # Label a subsample, stream samples as JSONL
//! autolabel run --images ./street --subsample 50 --format jsonl
//!
//! # Show the caption and word spans for a class list
//! autolabel spans "red car" "blue car"
//!
//! # View configuration
//! autolabel config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Autolabel - auto-label images with an open-vocabulary detector.
#[derive(Parser, Debug)]
#[command(name = "autolabel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "AUTOLABEL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Label images and export the dataset
    Run(cli::run::RunArgs),

    /// Print a caption and the character spans of its words
    Spans(cli::spans::SpansArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config problems go straight to stderr.
    let config = match cli::config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e:#}\n  \
                 Using default configuration. Check your config file with `autolabel config path`."
            );
            autolabel_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Autolabel v{}", autolabel_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Spans(args) => cli::spans::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref(), &config),
    }
}
