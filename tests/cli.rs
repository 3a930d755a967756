use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

fn autobuyer() -> Command {
    let mut cmd = Command::cargo_bin("swarm-autobuyer").unwrap();
    for key in ["AUTOBUYER_URL", "AUTOBUYER_HEADLESS", "AUTOBUYER_WS_URL", "RUST_LOG"] {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn config_show_merges_file_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autobuyer.yaml");
    fs::write(&path, "engine:\n  cycle_interval_ms: 45000\n").unwrap();

    let output = autobuyer()
        .args(["config", "show", "--config"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("cycle_interval_ms: 45000"));
    assert!(stdout.contains("countdown_tick_ms: 1000"));
    assert!(stdout.contains("url: https://www.swarmsim.com/"));
}

#[test]
fn config_validate_fails_on_bad_url() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autobuyer.yaml");
    fs::write(&path, "browser:\n  url: \"::nope::\"\n").unwrap();

    autobuyer()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn environment_overrides_reach_the_config() {
    let dir = tempdir().unwrap();
    let output = autobuyer()
        .current_dir(dir.path())
        .env("AUTOBUYER_URL", "http://localhost:9000/")
        .args(["config", "show"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("url: http://localhost:9000/"));
}

#[test]
fn version_carries_build_metadata() {
    let output = autobuyer().arg("--version").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(stdout.contains("built "));
}
