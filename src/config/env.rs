//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

use super::{AppConfig, WeightStrategy};

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_SPLITTER";

/// Configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Config file from SUITE_SPLITTER_CONFIG
    pub config_file: Option<String>,
    /// Split threshold from SUITE_SPLITTER_LARGE
    pub large: Option<u64>,
    /// Worker count from SUITE_SPLITTER_COUNT
    pub count: Option<usize>,
    /// Weight strategy from SUITE_SPLITTER_STRATEGY
    pub strategy: Option<String>,
    /// History directory from SUITE_SPLITTER_HISTORY
    pub history: Option<String>,
    /// Suite root enforcement from SUITE_SPLITTER_ENFORCE_SUITE
    pub enforce_suite: Option<bool>,
    /// Log level from SUITE_SPLITTER_LOG
    pub log: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            config_file: get_env("CONFIG"),
            large: get_env_parse("LARGE"),
            count: get_env_parse("COUNT"),
            strategy: get_env("STRATEGY"),
            history: get_env("HISTORY"),
            enforce_suite: get_env_bool("ENFORCE_SUITE"),
            log: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.config_file.is_some()
            || self.large.is_some()
            || self.count.is_some()
            || self.strategy.is_some()
            || self.history.is_some()
            || self.enforce_suite.is_some()
            || self.log.is_some()
    }

    /// Get worker count with fallback
    pub fn count_or(&self, default: usize) -> usize {
        self.count.unwrap_or(default)
    }

    /// Override `config` with every variable that is set
    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(large) = self.large {
            config.large_threshold = large;
        }
        if let Some(strategy) = &self.strategy {
            config.weight_strategy = WeightStrategy::from_str(strategy)
                .ok_or_else(|| anyhow!("Invalid {ENV_PREFIX}_STRATEGY '{strategy}'"))?;
        }
        if let Some(history) = &self.history {
            config.history_dir = Some(PathBuf::from(history));
        }
        if let Some(enforce) = self.enforce_suite {
            config.enforce_suite_root = enforce;
        }
        if let Some(log) = &self.log {
            config.log_level = log.clone();
        }
        Ok(())
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_CONFIG:         {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LARGE:          {:?}", ENV_PREFIX, self.large);
        println!("  {}_COUNT:          {:?}", ENV_PREFIX, self.count);
        println!("  {}_STRATEGY:       {:?}", ENV_PREFIX, self.strategy);
        println!("  {}_HISTORY:        {:?}", ENV_PREFIX, self.history);
        println!("  {}_ENFORCE_SUITE:  {:?}", ENV_PREFIX, self.enforce_suite);
        println!("  {}_LOG:            {:?}", ENV_PREFIX, self.log);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all SUITE_SPLITTER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_CONFIG         Path to configuration file");
    println!("  {ENV_PREFIX}_LARGE          Weight above which a fixture group is split");
    println!("  {ENV_PREFIX}_COUNT          Number of workers to partition for");
    println!("  {ENV_PREFIX}_STRATEGY       Weight strategy (average, latest, uniform)");
    println!("  {ENV_PREFIX}_HISTORY        History directory");
    println!("  {ENV_PREFIX}_ENFORCE_SUITE  Require suite pages as context roots (true/false)");
    println!("  {ENV_PREFIX}_LOG            Log level (trace, debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_COUNT=6");
    println!("  export {ENV_PREFIX}_STRATEGY=latest");
    println!("  suite-splitter split --tree pages.yaml --suite FrontPage.AcceptanceTests");
}
