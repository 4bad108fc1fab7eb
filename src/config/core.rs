//! Layered configuration: embedded defaults, an optional file, environment
//! variables, and CLI overrides, merged in ascending priority order via
//! `figment`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use super::smart_load;
use super::{ConfigOverrides, ShuttleConfig};
use crate::error::{Result, ShuttleError};

const DEFAULT_CONFIG: &str = include_str!("../../defaults.toml");

/// Build the merged configuration: defaults < file < env < CLI.
pub fn load(config_file: Option<&str>, overrides: &ConfigOverrides) -> Result<ShuttleConfig> {
    let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

    if let Some(path) = config_file {
        figment = figment.merge(smart_load::auto(path));
    }

    figment = figment.merge(Env::prefixed("SHUTTLE_"));
    figment = figment.merge(Serialized::defaults(overrides));

    figment
        .extract()
        .map_err(|e| ShuttleError::Preflight(format!("invalid configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_defaults() {
        let config = load(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.settings.max_scan_threads, 1);
        assert_eq!(config.logging.log_level, "INFO");
    }
}
