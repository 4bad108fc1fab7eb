//! Command-line interface for the scan-and-dispatch engine.
//!
//! There is no internal scheduling loop: `run` executes one pipeline pass to
//! completion and exits; repeated invocation is left to cron/systemd.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

mod output;

pub use output::Output;

use crate::config::{core as config_core, ConfigOverrides, RunContext, SettingsOverride};
use crate::error::exit_code;
use crate::ledger;
use crate::notify::LogNotifier;
use crate::supervisor::Supervisor;
use crate::tracker::Tracker;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (TOML, JSON, or YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one pipeline pass: stage, scan, and dispatch every eligible file
    Run {
        /// Override the configured scan worker count
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print today's tracker totals and ledger attestations
    Status,
    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the fully merged configuration
    Show,
    /// Validate the configuration and exit non-zero on the first error
    Validate,
}

impl Cli {
    pub async fn run(self) -> Result<i32> {
        let output = Output::new(self.debug);

        match self.command {
            Some(Commands::Run { threads }) => run_pipeline(self.config.as_deref(), threads, &output),
            Some(Commands::Status) => show_status(self.config.as_deref(), &output),
            Some(Commands::Config(ConfigCommands::Show)) => show_config(self.config.as_deref(), &output),
            Some(Commands::Config(ConfigCommands::Validate)) => validate_config(self.config.as_deref(), &output),
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(exit_code::OK)
            }
        }
    }
}

fn overrides(threads: Option<usize>) -> ConfigOverrides {
    ConfigOverrides {
        settings: threads.map(|max_scan_threads| SettingsOverride {
            max_scan_threads: Some(max_scan_threads),
        }),
        logging: None,
    }
}

fn run_pipeline(config_path: Option<&str>, threads: Option<usize>, output: &Output) -> Result<i32> {
    output.debug(&format!(
        "loading configuration from {} (threads override: {threads:?})",
        config_path.unwrap_or("<embedded defaults>")
    ));
    let config = config_core::load(config_path, &overrides(threads))?;
    let context = RunContext::build(config, chrono::Utc::now().to_rfc3339())?;
    let supervisor = Supervisor::new(context, Box::new(LogNotifier));
    match supervisor.run() {
        Ok(_) => {
            output.success("run complete");
            Ok(exit_code::OK)
        }
        Err(e) => {
            output.error(&e.to_string());
            Ok(e.exit_code())
        }
    }
}

fn show_status(config_path: Option<&str>, output: &Output) -> Result<i32> {
    let config = config_core::load(config_path, &ConfigOverrides::default())?;
    let tracker = Tracker::load(config.paths.log.clone())?;
    let snapshot = tracker.snapshot();
    output.info(&format!(
        "pending={} success={} failure={} suspect={}",
        snapshot.pending_count, snapshot.success_count, snapshot.failure_count, snapshot.suspect_count
    ));

    // Acquires no lock, so this is safe to run alongside an in-progress run.
    match ledger::load_ledger(&config.paths.ledger) {
        Ok(ledger) => {
            if ledger.entries.is_empty() {
                output.info("ledger: no attestation entries");
            }
            for entry in &ledger.entries {
                output.info(&format!(
                    "ledger: {} {} -> {:?} ({})",
                    entry.scanner, entry.version, entry.result, entry.tested_at
                ));
            }
        }
        Err(e) => output.warning(&format!("ledger unreadable: {e}")),
    }
    Ok(exit_code::OK)
}

fn show_config(config_path: Option<&str>, output: &Output) -> Result<i32> {
    let config = config_core::load(config_path, &ConfigOverrides::default())?;
    output.info(&serde_json::to_string_pretty(&serde_json::to_value(&ConfigView::from(&config))?)?);
    Ok(exit_code::OK)
}

fn validate_config(config_path: Option<&str>, output: &Output) -> Result<i32> {
    let config = config_core::load(config_path, &ConfigOverrides::default())?;
    match config.validate() {
        Ok(()) => {
            output.success("configuration is valid");
            Ok(exit_code::OK)
        }
        Err(e) => {
            output.error(&e.to_string());
            Ok(exit_code::PREFLIGHT)
        }
    }
}

/// A serializable view of the merged config for `config show`; `ShuttleConfig`
/// itself only derives `Deserialize` since it's never re-serialized except here.
#[derive(serde::Serialize)]
struct ConfigView {
    source: std::path::PathBuf,
    destination: std::path::PathBuf,
    quarantine: std::path::PathBuf,
    max_scan_threads: usize,
    throttle: bool,
    log_level: String,
}

impl From<&crate::config::ShuttleConfig> for ConfigView {
    fn from(c: &crate::config::ShuttleConfig) -> Self {
        Self {
            source: c.paths.source.clone(),
            destination: c.paths.destination.clone(),
            quarantine: c.paths.quarantine.clone(),
            max_scan_threads: c.settings.max_scan_threads,
            throttle: c.settings.throttle,
            log_level: c.logging.log_level.clone(),
        }
    }
}
