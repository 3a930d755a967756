//! Chromium DevTools Protocol access for the auto-buyer.
//!
//! A [`session::PageSession`] launches (or attaches to) Chromium, keeps one
//! tab on the game, and evaluates scripts in it. Everything above this crate
//! talks to the page through the [`Cdp`] trait only.

use std::{env, path::PathBuf};

use which::which;

pub mod metrics;
pub mod session;

pub use config::CdpConfig;
pub use error::{AdapterError, AdapterErrorKind};
pub use session::{Cdp, PageSession};

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the adapter.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("navigation timed out")]
        NavTimeout,
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("script failed")]
        ScriptFailed,
        #[error("internal error")]
        Internal,
    }

    impl AdapterErrorKind {
        pub fn as_str(self) -> &'static str {
            match self {
                AdapterErrorKind::NavTimeout => "nav_timeout",
                AdapterErrorKind::CdpIo => "cdp_io",
                AdapterErrorKind::ScriptFailed => "script_failed",
                AdapterErrorKind::Internal => "internal",
            }
        }
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self { kind, hint: None }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }
    }
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::{
        env,
        path::{Path, PathBuf},
        time::Duration,
    };

    /// Configuration for launching or attaching to Chromium.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CdpConfig {
        pub executable: PathBuf,
        pub user_data_dir: PathBuf,
        pub headless: bool,
        /// Upper bound for a single script evaluation.
        pub default_deadline_ms: u64,
        /// Upper bound for launching the browser and loading the game tab.
        pub launch_timeout_ms: u64,
        /// Attach to an already running browser instead of launching one.
        pub websocket_url: Option<String>,
        pub no_sandbox: bool,
    }

    impl Default for CdpConfig {
        fn default() -> Self {
            Self {
                executable: default_chrome_path(),
                user_data_dir: default_profile_dir(),
                headless: false,
                default_deadline_ms: 10_000,
                launch_timeout_ms: 30_000,
                websocket_url: None,
                no_sandbox: false,
            }
        }
    }

    impl CdpConfig {
        pub fn deadline(&self) -> Duration {
            Duration::from_millis(self.default_deadline_ms)
        }

        pub fn launch_timeout(&self) -> Duration {
            Duration::from_millis(self.launch_timeout_ms)
        }
    }

    fn default_chrome_path() -> PathBuf {
        detect_chrome_executable().unwrap_or_default()
    }

    fn default_profile_dir() -> PathBuf {
        if let Ok(path) = env::var("AUTOBUYER_CHROME_PROFILE") {
            return PathBuf::from(path);
        }

        let default = Path::new("./.autobuyer-profile");
        default.into()
    }
}

/// Names looked up on `PATH`, most specific first.
const CHROME_NAMES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium",
    "chromium-browser",
];

#[cfg(target_os = "macos")]
const CHROME_INSTALLS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(not(target_os = "macos"))]
const CHROME_INSTALLS: &[&str] = &["/usr/bin/google-chrome", "/snap/bin/chromium"];

/// Finds a Chromium binary: `AUTOBUYER_CHROME`, then `PATH`, then the usual
/// install locations.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    locate_chrome(env::var("AUTOBUYER_CHROME").ok())
}

fn locate_chrome(configured: Option<String>) -> Option<PathBuf> {
    configured
        .map(|raw| PathBuf::from(raw.trim()))
        .filter(|path| path.is_file())
        .or_else(|| CHROME_NAMES.iter().find_map(|name| which(name).ok()))
        .or_else(|| {
            CHROME_INSTALLS
                .iter()
                .map(PathBuf::from)
                .find(|path| path.is_file())
        })
}
