//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{AppConfig, WeightStrategy};
use crate::grouping::FixtureNames;
use crate::models::PagePath;
use crate::utils::logger::LogLevel;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./suite-splitter.yaml",
    "./suite-splitter.yml",
    "./.suite-splitter.yaml",
    "~/.config/suite-splitter/config.yaml",
];

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Full configuration file structure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
        }
    }
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load from the first standard location, or defaults when none exists
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            bail!("Unsupported config version: {}", self.version);
        }

        let app = &self.app;
        if app.max_concurrent == 0 {
            bail!("max_concurrent must be at least 1");
        }
        if LogLevel::from_str(&app.log_level).is_none() {
            bail!("Invalid log level '{}'", app.log_level);
        }

        validate_fixture_name("setup", &app.fixtures.setup)?;
        validate_fixture_name("teardown", &app.fixtures.teardown)?;
        if app.fixtures.setup == app.fixtures.teardown {
            bail!(
                "Fixture setup and teardown names must differ, both are '{}'",
                app.fixtures.setup
            );
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            version: "1.0".to_string(),
            app: AppConfig {
                large_threshold: 600_000,
                weight_strategy: WeightStrategy::Latest,
                default_weight: 30_000,
                max_concurrent: 8,
                page_timeout_secs: 900,
                history_dir: Some(PathBuf::from("./.suite-splitter/history")),
                fixtures: FixtureNames::default(),
                ..AppConfig::default()
            },
        }
    }
}

fn validate_fixture_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Fixture {kind} name must not be empty");
    }
    if name.contains(PagePath::SEPARATOR) {
        bail!("Fixture {kind} name '{name}' must be a single page name");
    }
    Ok(())
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
