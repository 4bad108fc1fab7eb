//! Configuration layer: the typed, validated shape produced by [`core::load`]
//! and frozen into an immutable [`RunContext`] for the run.

pub mod core;
mod smart_load;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShuttleError};

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub quarantine: PathBuf,
    pub log: PathBuf,
    pub hazard_archive: PathBuf,
    pub hazard_encryption_key: PathBuf,
    pub ledger: PathBuf,
    pub lock_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    pub max_scan_threads: usize,
    pub delete_source_files_after_copying: bool,
    pub defender_handles_suspect_files: bool,
    pub on_demand_defender: bool,
    pub on_demand_clam_av: bool,
    pub throttle: bool,
    pub throttle_free_space_mb: u64,
    pub throttle_max_file_count_per_run: u64,
    pub throttle_max_file_volume_mb_per_run: u64,
    pub throttle_max_file_count_per_day: u64,
    pub throttle_max_file_volume_mb_per_day: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanningConfig {
    pub malware_scan_timeout_seconds: u64,
    pub malware_scan_retry_wait_seconds: u64,
    pub malware_scan_retry_count: u32,
    pub stability_check_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl LoggingConfig {
    /// Map the configured `DEBUG`/`INFO`/`WARNING`/`ERROR`/`CRITICAL` level onto
    /// a `tracing`/`EnvFilter` directive. `tracing` has no `CRITICAL` level, so
    /// it is treated as `ERROR` for filtering purposes. Unrecognized values
    /// fall back to `INFO` rather than erroring, since this only governs log
    /// verbosity.
    pub fn tracing_filter_directive(&self) -> &'static str {
        match self.log_level.to_ascii_uppercase().as_str() {
            "DEBUG" => "debug",
            "INFO" => "info",
            "WARNING" => "warn",
            "ERROR" => "error",
            "CRITICAL" => "error",
            _ => "info",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShuttleConfig {
    pub paths: PathsConfig,
    pub settings: SettingsConfig,
    pub scanning: ScanningConfig,
    pub logging: LoggingConfig,
}

impl ShuttleConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.settings.on_demand_defender && !self.settings.on_demand_clam_av {
            return Err(ShuttleError::Preflight("at least one scanner must be enabled".into()));
        }
        Ok(())
    }
}

/// The immutable, validated materialization of [`ShuttleConfig`] shared
/// read-only across the supervisor, stager, orchestrator, and dispatcher.
pub struct RunContext {
    pub config: ShuttleConfig,
    pub run_started_at_rfc3339: String,
}

impl RunContext {
    pub fn build(config: ShuttleConfig, run_started_at_rfc3339: String) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            run_started_at_rfc3339,
        })
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        let secs = self.config.scanning.malware_scan_timeout_seconds;
        if secs == 0 {
            None
        } else {
            Some(Duration::from_secs(secs))
        }
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.config.scanning.malware_scan_retry_wait_seconds)
    }

    pub fn stability_check_interval(&self) -> Duration {
        Duration::from_millis(self.config.scanning.stability_check_interval_ms)
    }
}

/// Flattened overrides the CLI can apply on top of file+env config; merged
/// last via `figment::providers::Serialized` so CLI wins ties.
#[derive(Debug, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingOverride>,
}

#[derive(Debug, Default, Serialize)]
pub struct SettingsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scan_threads: Option<usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct LoggingOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}
