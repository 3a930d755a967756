use std::fs;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::metrics;

/// Script evaluation against the game tab.
#[async_trait]
pub trait Cdp: Send + Sync {
    /// Evaluates `script` as an expression and returns its JSON value.
    /// `undefined` comes back as `Value::Null`; promises are awaited.
    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError>;
}

/// One browser plus the tab the game runs in.
pub struct PageSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    deadline: Duration,
    attached: bool,
}

impl PageSession {
    /// Launches Chromium (or attaches when `websocket_url` is set) and opens
    /// `url`, reusing an existing tab that already shows it.
    pub async fn open(cfg: &CdpConfig, url: &str) -> Result<Self, AdapterError> {
        let target = Url::parse(url).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("invalid game url {url}: {err}"))
        })?;

        let attached = cfg.websocket_url.is_some();
        let connect = async {
            let connected = match &cfg.websocket_url {
                Some(ws) => Browser::connect(ws.clone()).await,
                None => Browser::launch(browser_config(cfg)?).await,
            };
            connected.map_err(map_cdp_error)
        };
        let (mut browser, mut handler) = timeout(cfg.launch_timeout(), connect)
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::NavTimeout)
                    .with_hint("browser did not come up in time")
            })??;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp-adapter", %err, "handler event error");
                }
            }
        });

        if attached {
            if let Err(err) = browser.fetch_targets().await {
                warn!(target: "cdp-adapter", %err, "listing existing targets failed");
            }
        }

        let page = match find_tab(&browser, &target).await {
            Some(page) => {
                info!(target: "cdp-adapter", url = %target, "reusing open game tab");
                page
            }
            None => timeout(cfg.launch_timeout(), browser.new_page(target.as_str()))
                .await
                .map_err(|_| {
                    AdapterError::new(AdapterErrorKind::NavTimeout)
                        .with_hint(format!("opening {target} timed out"))
                })?
                .map_err(map_cdp_error)?,
        };
        info!(target: "cdp-adapter", url = %target, attached, "page session ready");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            deadline: cfg.deadline(),
            attached,
        })
    }

    /// Closes a launched browser. An attached one is only detached from.
    pub async fn close(&self) {
        let mut browser = self.browser.lock().await;
        if !self.attached {
            match browser.close().await {
                Ok(_) => {
                    if let Err(err) = browser.wait().await {
                        warn!(target: "cdp-adapter", %err, "waiting for browser exit failed");
                    }
                }
                Err(err) => warn!(target: "cdp-adapter", %err, "closing browser failed"),
            }
        }
        self.handler.abort();
    }
}

#[async_trait]
impl Cdp for PageSession {
    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        let started = Instant::now();
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;

        let result = match timeout(self.deadline, self.page.evaluate_expression(params)).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                let err = map_cdp_error(err);
                metrics::record_evaluation_failure(err.kind);
                return Err(err);
            }
            Err(_) => {
                metrics::record_evaluation_failure(AdapterErrorKind::CdpIo);
                return Err(AdapterError::new(AdapterErrorKind::CdpIo)
                    .with_hint(format!("evaluation exceeded {:?}", self.deadline)));
            }
        };
        metrics::record_evaluation(started.elapsed());
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

async fn find_tab(browser: &Browser, target: &Url) -> Option<Page> {
    let pages = match browser.pages().await {
        Ok(pages) => pages,
        Err(err) => {
            debug!(target: "cdp-adapter", %err, "listing pages failed");
            return None;
        }
    };
    for page in pages {
        let Ok(Some(current)) = page.url().await else {
            continue;
        };
        if same_document(target, &current) {
            return Some(page);
        }
    }
    None
}

/// Same host and path; query and fragment are ignored.
pub fn same_document(target: &Url, current: &str) -> bool {
    match Url::parse(current) {
        Ok(current) => {
            current.host_str() == target.host_str()
                && current.path().trim_end_matches('/') == target.path().trim_end_matches('/')
        }
        Err(_) => false,
    }
}

fn browser_config(cfg: &CdpConfig) -> Result<BrowserConfig, AdapterError> {
    if !cfg.executable.as_os_str().is_empty() && !cfg.executable.exists() {
        return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint(format!(
            "chrome executable not found at {}; set AUTOBUYER_CHROME to the full path",
            cfg.executable.display()
        )));
    }

    let profile_dir = if cfg.user_data_dir.is_absolute() {
        cfg.user_data_dir.clone()
    } else {
        let cwd = std::env::current_dir().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("failed to resolve cwd for user-data-dir: {err}"))
        })?;
        cwd.join(&cfg.user_data_dir)
    };
    fs::create_dir_all(&profile_dir).map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal)
            .with_hint(format!("failed to ensure user-data-dir: {err}"))
    })?;

    let mut builder = BrowserConfig::builder()
        .request_timeout(cfg.deadline())
        .launch_timeout(cfg.launch_timeout());

    if !cfg.headless {
        builder = builder.with_head();
    }
    if cfg.no_sandbox {
        builder = builder.no_sandbox();
    }

    // Background tabs must keep ticking or the game clock stalls.
    let mut args = vec![
        "--disable-background-timer-throttling",
        "--disable-backgrounding-occluded-windows",
        "--disable-renderer-backgrounding",
        "--disable-breakpad",
        "--disable-default-apps",
        "--disable-dev-shm-usage",
        "--disable-popup-blocking",
        "--no-first-run",
        "--no-default-browser-check",
        "--password-store=basic",
        "--remote-allow-origins=*",
    ];
    if cfg.headless {
        args.push("--headless=new");
        args.push("--mute-audio");
    }
    builder = builder.args(args);

    if !cfg.executable.as_os_str().is_empty() {
        builder = builder.chrome_executable(cfg.executable.clone());
    }
    builder = builder.user_data_dir(profile_dir);

    builder.build().map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal)
            .with_hint(format!("browser config error: {err}"))
    })
}

fn map_cdp_error(err: CdpError) -> AdapterError {
    match err {
        CdpError::JavascriptException(details) => {
            let message = details
                .exception
                .as_ref()
                .and_then(|exception| exception.description.clone())
                .unwrap_or_else(|| details.text.clone());
            AdapterError::new(AdapterErrorKind::ScriptFailed).with_hint(message)
        }
        CdpError::Timeout => {
            AdapterError::new(AdapterErrorKind::CdpIo).with_hint("cdp request timed out")
        }
        other => AdapterError::new(AdapterErrorKind::CdpIo).with_hint(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_tab_on_host_and_path() {
        let target = Url::parse("https://www.swarmsim.com/#/tab/meat").unwrap();
        assert!(same_document(&target, "https://www.swarmsim.com/"));
        assert!(same_document(&target, "https://www.swarmsim.com/#/tab/larva"));
        assert!(!same_document(&target, "https://example.com/"));
        assert!(!same_document(&target, "about:blank"));
    }

    #[test]
    fn cdp_timeouts_surface_as_io_errors() {
        let err = map_cdp_error(CdpError::Timeout);
        assert_eq!(err.kind, AdapterErrorKind::CdpIo);
        assert_eq!(err.to_string(), "cdp i/o failure: cdp request timed out");
    }

    #[test]
    fn missing_executable_is_reported() {
        let cfg = CdpConfig {
            executable: "/definitely/not/here/chrome".into(),
            ..CdpConfig::default()
        };
        let err = browser_config(&cfg).unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::CdpIo);
        assert!(err.hint.unwrap().contains("AUTOBUYER_CHROME"));
    }
}
