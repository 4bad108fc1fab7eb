use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shuttle::cli::Cli;
use shuttle::config::{core as config_core, ConfigOverrides};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.config.as_deref(), cli.debug);

    let exit_code = cli.run().await?;
    std::process::exit(exit_code);
}

/// Install the `tracing` subscriber with the configured `logging.log_level`
/// (per SPEC_FULL.md §4.12) as the default filter, before any subcommand
/// runs. `RUST_LOG` still overrides it if set, and `--debug` forces `debug`
/// regardless of what's configured.
fn init_logging(config_path: Option<&str>, debug: bool) {
    let directive = if debug {
        "debug"
    } else {
        config_core::load(config_path, &ConfigOverrides::default())
            .map(|c| c.logging.tracing_filter_directive())
            .unwrap_or("info")
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
