//! Error taxonomy for the scan-and-dispatch engine.
//!
//! Library code returns [`ShuttleError`] so callers can match on kind where
//! the run lifecycle needs to (throttle exhaustion and circuit-breaker trips
//! map to distinct process exit codes). The binary boundary wraps these in
//! `anyhow` for convenient `.context(...)` chaining.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShuttleError {
    #[error("preflight check failed: {0}")]
    Preflight(String),

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("scan timed out after {0} attempt(s)")]
    ScanTimeout(u32),

    #[error("scan failed: {0}")]
    ScanFailed(String),

    #[error("integrity mismatch for {path}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("encryption failed for {path}: {reason}")]
    EncryptionFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("circuit breaker tripped after {0} timed-out scan(s)")]
    CircuitBreakerTripped(usize),
}

pub type Result<T> = std::result::Result<T, ShuttleError>;

/// Fixed non-zero process exit codes, per the persisted-state/exit-code contract.
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const PREFLIGHT: i32 = 2;
    pub const THROTTLED: i32 = 3;
    pub const CIRCUIT_BREAKER: i32 = 4;
    pub const OTHER: i32 = 1;
}

impl ShuttleError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ShuttleError::Preflight(_) => exit_code::PREFLIGHT,
            ShuttleError::Throttled(_) => exit_code::THROTTLED,
            ShuttleError::CircuitBreakerTripped(_) => exit_code::CIRCUIT_BREAKER,
            _ => exit_code::OTHER,
        }
    }
}
