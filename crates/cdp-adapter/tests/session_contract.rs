//! Contract tests against a real Chromium binary. Ignored by default.

use std::env;

use cdp_adapter::{Cdp, CdpConfig, PageSession};
use serde_json::json;

fn contract_enabled() -> bool {
    env::var("AUTOBUYER_CDP_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set AUTOBUYER_CDP_CONTRACT=1"]
async fn contract_evaluates_scripts() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (AUTOBUYER_CDP_CONTRACT not enabled)");
        return;
    }

    let cfg = CdpConfig {
        headless: true,
        ..CdpConfig::default()
    };
    let session = PageSession::open(&cfg, "data:text/html,<p>42</p>")
        .await
        .expect("session opens");

    let value = session
        .evaluate("(() => ({ n: Number(document.querySelector('p').textContent) }))()")
        .await
        .expect("evaluate succeeds");
    assert_eq!(value, json!({ "n": 42 }));

    let undefined = session.evaluate("void 0").await.expect("undefined is fine");
    assert!(undefined.is_null());

    let err = session
        .evaluate("(() => { throw new Error('boom'); })()")
        .await
        .unwrap_err();
    assert_eq!(err.kind, cdp_adapter::AdapterErrorKind::ScriptFailed);

    session.close().await;
}
