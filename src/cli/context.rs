use std::path::Path;
use std::path::PathBuf;

use swarm_autobuyer::AppConfig;

pub struct CliContext {
    config: AppConfig,
    config_path: Option<PathBuf>,
    metrics_port: u16,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>, metrics_port: u16) -> Self {
        Self {
            config,
            config_path,
            metrics_port,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// File the configuration was read from; `None` when running on defaults.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn metrics_port(&self) -> u16 {
        self.metrics_port
    }
}
