//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;
use warden_config::{LayerStatus, WardenConfig};
use warden_session::RegistryConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration and where it was loaded from
    Show,

    /// Show the user configuration file path
    Path,

    /// Write a config file populated with defaults
    Init {
        /// Create project-local config (./warden.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Resolved configuration for JSON output.
#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    sources: Vec<String>,
    warnings: &'a [String],
    session: RegistryConfig,
    logging: warden_config::LoggingConfig,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Init { local, force } => cmd_init(local, force, ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let session = loaded.config.registry_config()?;
    let logging = loaded.config.logging();

    if ctx.json_output {
        let output = ShowOutput {
            sources: loaded
                .loaded_from()
                .map(|p| p.display().to_string())
                .collect(),
            warnings: &loaded.warnings,
            session,
            logging,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    println!();
    println!("{}", style("Warden Configuration").bold());
    println!("{}", dim.apply_to("─".repeat(40)));

    let sources: Vec<_> = loaded.loaded_from().collect();
    if sources.is_empty() {
        println!("  {}", dim.apply_to("No config files loaded (using defaults)"));
    } else {
        for path in sources {
            println!("  {} {}", dim.apply_to("Loaded:"), path.display());
        }
    }
    if ctx.verbose {
        for source in loaded.sources.iter().filter(|s| !s.is_loaded()) {
            let label = match source.status {
                LayerStatus::Rejected => "Rejected:",
                _ => "Skipped:",
            };
            println!("  {} {}", dim.apply_to(label), source.path.display());
        }
    }
    for warning in &loaded.warnings {
        println!("  {} {}", Style::new().yellow().apply_to("Warning:"), warning);
    }

    println!();
    println!("{}", style("[session]").cyan());
    println!("  {} {}", dim.apply_to("lifetime:"), session.lifetime);
    println!("  {} {}", dim.apply_to("id_length:"), session.id_length);
    println!();
    println!("{}", style("[logging]").cyan());
    println!("  {} {}", dim.apply_to("level:"), logging.level());
    println!("  {} {}", dim.apply_to("json:"), logging.json());
    println!();

    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let Some(path) = warden_config::user_config_path() else {
        bail!("could not determine the user config directory");
    };

    if ctx.json_output {
        println!("{}", serde_json::json!({ "path": path.display().to_string() }));
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_init(local: bool, force: bool, ctx: &Context) -> Result<()> {
    let path = if local {
        PathBuf::from("warden.toml")
    } else {
        match warden_config::user_config_path() {
            Some(path) => path,
            None => bail!("could not determine the user config directory"),
        }
    };

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    warden_config::write_config(&WardenConfig::with_defaults(), &path)?;
    tracing::debug!(path = %path.display(), "Config file written");

    if ctx.json_output {
        println!("{}", serde_json::json!({ "created": path.display().to_string() }));
    } else {
        println!("Created {}", path.display());
    }
    Ok(())
}
