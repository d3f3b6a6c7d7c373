//! History-backed weights
//!
//! Weights come from the recorded runtimes of previous executions. A page
//! with no history weighs the configured default; a page whose history
//! cannot be read makes the weight unavailable.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::WeightSource;
use crate::error::{PartitionError, Result};
use crate::models::PagePath;
use crate::results::HistoryStore;

/// How recorded runtimes turn into a weight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeStrategy {
    /// Runtime of the most recent execution
    Latest,
    /// Mean runtime over every recorded execution
    #[default]
    Average,
}

impl RuntimeStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "latest" | "last" => Some(RuntimeStrategy::Latest),
            "average" | "avg" | "mean" => Some(RuntimeStrategy::Average),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeStrategy::Latest => write!(f, "latest"),
            RuntimeStrategy::Average => write!(f, "average"),
        }
    }
}

/// Weight source reading the execution history store
pub struct HistoryWeightSource {
    store: HistoryStore,
    strategy: RuntimeStrategy,
    default_weight: u64,
}

impl HistoryWeightSource {
    pub fn new(store: HistoryStore, strategy: RuntimeStrategy) -> Self {
        Self {
            store,
            strategy,
            default_weight: 1,
        }
    }

    /// Weight used for pages that have never been executed
    pub fn with_default_weight(mut self, weight: u64) -> Self {
        self.default_weight = weight;
        self
    }

    pub fn strategy(&self) -> RuntimeStrategy {
        self.strategy
    }
}

impl WeightSource for HistoryWeightSource {
    fn weight(&self, path: &PagePath) -> Result<u64> {
        let history = self
            .store
            .page_history(path)
            .map_err(|e| PartitionError::weight_unavailable(path, format!("{e:#}")))?;

        let weight = history.and_then(|h| match self.strategy {
            RuntimeStrategy::Latest => h.latest().map(|r| r.duration_ms),
            RuntimeStrategy::Average => h.average_duration_ms(),
        });

        match weight {
            Some(weight) => Ok(weight),
            None => {
                warn!("No page history available: {path}");
                Ok(self.default_weight)
            }
        }
    }
}
