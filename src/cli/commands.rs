use clap::Subcommand;

use super::config::ConfigArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Open the game and run the auto-buyer until Ctrl-C
    Run(RunArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
