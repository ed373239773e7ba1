//! Gen-id command - print freshly generated session ids.

use anyhow::Result;
use clap::Args;
use warden_session::RegistryConfig;

use super::Context;

/// Arguments for the gen-id command.
#[derive(Args, Debug)]
pub struct GenIdArgs {
    /// Id length (defaults to the configured `session.id_length`)
    #[arg(short, long)]
    pub length: Option<usize>,

    /// How many ids to print
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

/// Run the gen-id command.
pub fn run(args: GenIdArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.loaded.config.registry_config()?;
    if let Some(length) = args.length {
        config = RegistryConfig::new(config.lifetime, length)?;
    }

    let ids: Vec<String> = (0..args.count)
        .map(|_| warden_session::generate_id(config.id_length))
        .collect();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for id in &ids {
            println!("{}", id);
        }
    }

    Ok(())
}
