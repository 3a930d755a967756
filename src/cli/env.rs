use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " on ",
    env!("GIT_BRANCH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Emit console logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Metrics server port (0 disables it); overrides `metrics_port` in the config
    #[arg(long, global = true)]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}
