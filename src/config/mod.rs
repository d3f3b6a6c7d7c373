//! Configuration module
//!
//! Handles loading and managing configuration.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::generator::DEFAULT_LARGE_THRESHOLD;
use crate::grouping::FixtureNames;
use crate::results::{default_history_dir, HistoryStore};
use crate::utils::logger::LogLevel;
use crate::weight::{HistoryWeightSource, RuntimeStrategy, StaticWeights, WeightSource};

/// Where page weights come from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightStrategy {
    /// Mean recorded runtime
    #[default]
    Average,
    /// Most recent recorded runtime
    Latest,
    /// Every page weighs `default_weight`
    Uniform,
}

impl WeightStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uniform" | "none" => Some(WeightStrategy::Uniform),
            other => RuntimeStrategy::from_str(other).map(Into::into),
        }
    }

    /// History strategy, `None` for uniform weights
    pub fn runtime(self) -> Option<RuntimeStrategy> {
        match self {
            WeightStrategy::Average => Some(RuntimeStrategy::Average),
            WeightStrategy::Latest => Some(RuntimeStrategy::Latest),
            WeightStrategy::Uniform => None,
        }
    }
}

impl From<RuntimeStrategy> for WeightStrategy {
    fn from(strategy: RuntimeStrategy) -> Self {
        match strategy {
            RuntimeStrategy::Average => WeightStrategy::Average,
            RuntimeStrategy::Latest => WeightStrategy::Latest,
        }
    }
}

impl fmt::Display for WeightStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightStrategy::Average => write!(f, "average"),
            WeightStrategy::Latest => write!(f, "latest"),
            WeightStrategy::Uniform => write!(f, "uniform"),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Groups heavier than this are split across workers
    pub large_threshold: u64,

    /// Require context roots to be suite pages
    pub enforce_suite_root: bool,

    /// Source of page weights
    pub weight_strategy: WeightStrategy,

    /// Weight of pages without history, and of every page when uniform
    pub default_weight: u64,

    /// Maximum contexts running at once
    pub max_concurrent: usize,

    /// Per-page command timeout in seconds
    pub page_timeout_secs: u64,

    /// Run each context's suite setup and teardown pages as part of the
    /// context, so their runtimes are recorded
    pub run_fixtures: bool,

    /// History directory, defaults to the user data directory
    pub history_dir: Option<PathBuf>,

    pub log_level: String,

    /// Names of the suite setup and teardown pages
    pub fixtures: FixtureNames,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            large_threshold: DEFAULT_LARGE_THRESHOLD,
            enforce_suite_root: true,
            weight_strategy: WeightStrategy::default(),
            default_weight: 1,
            max_concurrent: 4,
            page_timeout_secs: 600,
            run_fixtures: true,
            history_dir: None,
            log_level: "info".to_string(),
            fixtures: FixtureNames::default(),
        }
    }
}

impl AppConfig {
    pub fn history_store(&self) -> HistoryStore {
        HistoryStore::new(self.history_dir.clone().unwrap_or_else(default_history_dir))
    }

    /// Weight source selected by `weight_strategy`
    pub fn weight_source(&self) -> Box<dyn WeightSource> {
        match self.weight_strategy.runtime() {
            Some(runtime) => Box::new(
                HistoryWeightSource::new(self.history_store(), runtime)
                    .with_default_weight(self.default_weight),
            ),
            None => Box::new(StaticWeights::uniform(self.default_weight)),
        }
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Parsed log level, info when unrecognised
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.log_level).unwrap_or_default()
    }
}
