//! Format-auto-detecting config file provider: picks TOML, JSON, or YAML
//! parsing for a user-supplied config file by extension (falling back to
//! content sniffing for an unrecognized one), so the three format providers
//! are never blindly stacked against the same file.

use std::path::Path;

use figment::providers::{Format, Json, Toml, Yaml};
use tracing::debug;

/// A provider that can be merged directly into a [`figment::Figment`].
pub fn auto<P: AsRef<Path>>(path: P) -> impl figment::Provider {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "toml" => SmartProvider::Toml(Toml::file(path)),
        "json" => SmartProvider::Json(Json::file(path)),
        "yaml" | "yml" => SmartProvider::Yaml(Yaml::file(path)),
        _ => match std::fs::read_to_string(path).ok().and_then(|c| detect_format(&c)) {
            Some(Detected::Json) => SmartProvider::Json(Json::file(path)),
            Some(Detected::Yaml) => SmartProvider::Yaml(Yaml::file(path)),
            Some(Detected::Toml) => SmartProvider::Toml(Toml::file(path)),
            None => {
                debug!(path = %path.display(), "could not detect config format, defaulting to TOML");
                SmartProvider::Toml(Toml::file(path))
            }
        },
    }
}

enum SmartProvider {
    Toml(figment::providers::Data<Toml>),
    Json(figment::providers::Data<Json>),
    Yaml(figment::providers::Data<Yaml>),
}

impl figment::Provider for SmartProvider {
    fn metadata(&self) -> figment::Metadata {
        match self {
            SmartProvider::Toml(p) => p.metadata(),
            SmartProvider::Json(p) => p.metadata(),
            SmartProvider::Yaml(p) => p.metadata(),
        }
    }

    fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

enum Detected {
    Json,
    Yaml,
    Toml,
}

fn detect_format(content: &str) -> Option<Detected> {
    let trimmed = content.trim();

    if (trimmed.starts_with('{') && trimmed.ends_with('}')) || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return Some(Detected::Json);
    }
    if trimmed.contains("---")
        || trimmed
            .lines()
            .any(|l| l.trim().contains(':') && !l.trim().starts_with('[') && !l.trim().ends_with(']'))
    {
        return Some(Detected::Yaml);
    }
    if trimmed.lines().any(|l| {
        let l = l.trim();
        (l.starts_with('[') && l.ends_with(']')) || (l.contains('=') && !l.contains(':'))
    }) {
        return Some(Detected::Toml);
    }
    None
}
