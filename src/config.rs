//! Application configuration.
//!
//! Loaded from YAML, then overridden by `AUTOBUYER_*` environment variables
//! and finally by command-line flags.

use std::env;
use std::path::{Path, PathBuf};

use autobuyer_scheduler::EngineConfig;
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};
use url::Url;

use crate::errors::AutobuyerError;

pub const DEFAULT_GAME_URL: &str = "https://www.swarmsim.com/";
pub const DEFAULT_METRICS_PORT: u16 = 9090;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: BrowserSection,
    pub engine: EngineConfig,
    /// Port for the Prometheus endpoint; 0 disables it.
    pub metrics_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser: BrowserSection::default(),
            engine: EngineConfig::default(),
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Game page opened (or reused) in the browser.
    pub url: String,
    #[serde(flatten)]
    pub session: CdpConfig,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_GAME_URL.to_string(),
            session: CdpConfig::default(),
        }
    }
}

/// Configuration together with the file it came from, if any.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_yaml(raw: &str, origin: &Path) -> Result<Self, AutobuyerError> {
        serde_yaml::from_str(raw).map_err(|source| AutobuyerError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_value("AUTOBUYER_URL") {
            self.browser.url = url;
        }
        if let Some(raw) = env_value("AUTOBUYER_HEADLESS") {
            match parse_flag(&raw) {
                Some(flag) => self.browser.session.headless = flag,
                None => warn!(value = %raw, "ignoring unrecognised AUTOBUYER_HEADLESS"),
            }
        }
        if let Some(ws) = env_value("AUTOBUYER_WS_URL") {
            self.browser.session.websocket_url = Some(ws);
        }
        if let Some(chrome) = env_value("AUTOBUYER_CHROME") {
            self.browser.session.executable = PathBuf::from(chrome);
        }
    }

    pub fn validate(&self) -> Result<(), AutobuyerError> {
        let url = Url::parse(&self.browser.url).map_err(|err| {
            AutobuyerError::invalid(format!("browser.url '{}': {err}", self.browser.url))
        })?;
        if !matches!(url.scheme(), "http" | "https" | "file") {
            return Err(AutobuyerError::invalid(format!(
                "browser.url must be http(s) or file, got '{}'",
                url.scheme()
            )));
        }
        if let Some(ws) = &self.browser.session.websocket_url {
            let parsed = Url::parse(ws).map_err(|err| {
                AutobuyerError::invalid(format!("browser.websocket_url '{ws}': {err}"))
            })?;
            if !matches!(parsed.scheme(), "ws" | "wss") {
                return Err(AutobuyerError::invalid(
                    "browser.websocket_url must use ws:// or wss://",
                ));
            }
        }
        self.engine.validate()?;
        Ok(())
    }
}

/// Resolves the config file: explicit path, `./config/autobuyer.yaml`, then
/// the user config directory.
pub fn config_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }
    let mut candidates = vec![PathBuf::from("config/autobuyer.yaml")];
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("swarm-autobuyer");
        dir.push("config.yaml");
        candidates.push(dir);
    }
    candidates
}

pub async fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, AutobuyerError> {
    let found = config_candidates(explicit)
        .into_iter()
        .find(|path| path.exists());

    let (mut config, path) = match found {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .await
                .map_err(|source| AutobuyerError::ConfigRead {
                    path: path.clone(),
                    source,
                })?;
            let config = AppConfig::from_yaml(&raw, &path)?;
            info!(path = %path.display(), "loaded configuration");
            (config, Some(path))
        }
        None => {
            if let Some(path) = explicit {
                warn!(path = %path.display(), "config file not found, using defaults");
            } else {
                info!("no config file found, using defaults");
            }
            (AppConfig::default(), None)
        }
    };

    config.apply_env_overrides();
    Ok(LoadedConfig { config, path })
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
