//! Configuration file support
//!
//! Tally reads an optional TOML file. Every key is optional; missing keys
//! fall back to the defaults below.
//!
//! ```toml
//! hidden_category = "Transfers"
//! fill_missing_months = true
//!
//! [projection]
//! window_days = 90
//! points = 3
//! step_days = 30
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::{FilterSpec, DEFAULT_HIDDEN_CATEGORY};
use crate::reports::ReportOptions;
use crate::trend::ProjectionConfig;

/// Dashboard server bind settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category excluded from views unless hidden rows are shown
    pub hidden_category: String,
    pub fill_missing_months: bool,
    pub projection: ProjectionConfig,
    pub server: ServerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hidden_category: DEFAULT_HIDDEN_CATEGORY.to_string(),
            fill_missing_months: false,
            projection: ProjectionConfig::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Config {
    /// Load from an explicit path, else the default location, else defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::parse(&content)
    }

    /// Parse config from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// A filter seeded with this config's hidden category
    pub fn filter(&self) -> FilterSpec {
        FilterSpec::new().hidden_category(self.hidden_category.clone())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            fill_missing: self.fill_missing_months,
            projection: self.projection.clone(),
            ..Default::default()
        }
    }
}

/// Default config location (~/.local/share/tally/config.toml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.hidden_category, "Hidden");
        assert_eq!(config.projection.points, 3);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
hidden_category = "Transfers"

[projection]
window_days = 30

[server]
port = 8080
"#,
        )
        .unwrap();

        assert_eq!(config.hidden_category, "Transfers");
        assert_eq!(config.projection.window_days, 30);
        assert_eq!(config.projection.step_days, 30);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.filter().hidden_category, "Transfers");
    }

    #[test]
    fn test_invalid_config() {
        let result = Config::parse("hidden_category = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fill_missing_months = true").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.fill_missing_months);
        assert!(config.report_options().fill_missing);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
