//! Warden - in-process session registry console
//!
//! Main entry point for the Warden CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, console, gen_id};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Warden - in-process session registry console
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Load this config file instead of discovering config layers
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate session ids
    GenId(gen_id::GenIdArgs),

    /// Interactive session registry console
    Console(console::ConsoleArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load_config(cli.config.as_deref())?;
    init_tracing(&loaded.config.logging(), cli.verbose);

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Config(args) => config::run(args, &ctx),
        Commands::GenId(args) => gen_id::run(args, &ctx),
        Commands::Console(args) => console::run(args, &ctx),
    }
}

/// Stderr logging, human-readable or JSON per `[logging]`.
fn init_tracing(logging: &warden_config::LoggingConfig, verbose: bool) {
    use tracing_subscriber::prelude::*;

    let filter = if verbose {
        "warden=debug,warden_session=debug,warden_config=debug,info"
    } else {
        logging.level()
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.json() {
        tracing_subscriber::registry()
            .with(
                layer
                    .json()
                    .with_filter(tracing_subscriber::EnvFilter::new(filter)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(layer.with_filter(tracing_subscriber::EnvFilter::new(filter)))
            .init();
    }
}
