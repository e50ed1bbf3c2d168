use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::cli::{Cli, OutputFormat};

/// Effective settings after layering defaults, settings file, env and flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub format: OutputFormat,
    pub log_level: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ocipa").join("config.toml"))
}

/// Load settings. An explicit `path` must exist; the default file is optional.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => load_from(Some(p), true),
        None => load_from(default_settings_path().as_deref(), false),
    }
}

fn load_from(path: Option<&Path>, required: bool) -> Result<Settings> {
    let mut builder = Config::builder()
        .set_default("format", "text")?
        .set_default("log_level", "warn")?
        .set_default("concurrency", 1)?
        .set_default("timeout_secs", 30)?;

    if let Some(p) = path {
        builder = builder.add_source(
            File::new(&p.to_string_lossy(), FileFormat::Toml).required(required),
        );
    }

    // Environment variable overrides, e.g., OCIPA__CONCURRENCY=4
    builder = builder.add_source(
        Environment::with_prefix("OCIPA")
            .try_parsing(true)
            .separator("__"),
    );

    let cfg = builder.build().context("Failed to load settings")?;
    cfg.try_deserialize().context("Invalid settings")
}

impl Settings {
    /// Command-line flags take precedence over every other layer.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(format) = cli.format {
            self.format = format;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = cli.timeout {
            self.timeout_secs = timeout;
        }
        if cli.endpoint.is_some() {
            self.endpoint = cli.endpoint.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_when_file_absent() {
        let settings = load_from(Some(Path::new("/nonexistent/ocipa.toml")), false).unwrap();
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.endpoint, None);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        assert!(load(Some(Path::new("/nonexistent/ocipa.toml"))).is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "format = \"json\"\nconcurrency = 6\n").unwrap();

        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.concurrency, 6);
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "format = \"json\"\ntimeout_secs = 10\n").unwrap();

        let mut settings = load(Some(&path)).unwrap();
        let cli = Cli::try_parse_from([
            "ocipa",
            "ocid1.user.oc1..aaaa",
            "--format",
            "table",
            "--endpoint",
            "http://localhost:8080/20160918",
        ])
        .unwrap();
        settings.apply_cli(&cli);

        assert_eq!(settings.format, OutputFormat::Table);
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.endpoint.as_deref(), Some("http://localhost:8080/20160918"));
    }
}
