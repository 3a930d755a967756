use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use swarm_autobuyer::AppConfig;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus environment overrides)
    Show,

    /// Print the built-in defaults
    Defaults,

    /// Validate the effective configuration
    Validate,
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            match ctx.config_path() {
                Some(path) => println!("# source: {}", path.display()),
                None => println!("# source: built-in defaults"),
            }
            print!("{}", render(ctx.config())?);
        }
        ConfigAction::Defaults => {
            print!("{}", render(&AppConfig::default())?);
        }
        ConfigAction::Validate => {
            ctx.config().validate()?;
            println!("Configuration is valid");
        }
    }
    Ok(())
}

fn render(config: &AppConfig) -> Result<String> {
    config.to_yaml().context("Failed to render configuration")
}
