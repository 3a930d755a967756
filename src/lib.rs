//! Unattended auto-buyer for Swarm Simulator.
//!
//! The engine crates decide and dispatch purchases through ports; this crate
//! serves those ports from a live Chromium tab and carries configuration and
//! metrics for the `swarm-autobuyer` binary.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod page;

pub use config::{AppConfig, BrowserSection, LoadedConfig};
pub use errors::AutobuyerError;
pub use page::PageBridge;
