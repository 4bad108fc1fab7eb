//! Shuttle: a quarantine-first secure file-transfer pipeline.
//!
//! Every file bound for the destination is staged into an isolated
//! quarantine, scanned by one or more antivirus adapters under a
//! circuit-breaker-guarded worker pool, and routed to the destination or an
//! encrypted hazard archive depending on verdict. A crash-safe daily tracker
//! is the sole source of truth for throughput accounting.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod orchestrator;
pub mod scanner;
pub mod stager;
pub mod supervisor;
pub mod throttle;
pub mod tracker;

pub use cli::{Cli, Output};
pub use config::ShuttleConfig;
pub use error::ShuttleError;

/// Result type alias for Shuttle library operations.
pub type Result<T> = anyhow::Result<T>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
