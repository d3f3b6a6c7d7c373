//! Page weights
//!
//! A weight is an opaque cost estimate (historically milliseconds) used to
//! balance parallel work. Sources are injected into the builder; nothing
//! here reads global state.

mod builder;
mod history;

pub use builder::WeightedGroupBuilder;
pub use history::{HistoryWeightSource, RuntimeStrategy};

use std::collections::HashMap;

use crate::error::{PartitionError, Result};
use crate::models::PagePath;

/// Supplies a cost estimate per page path
pub trait WeightSource {
    /// Weight of the page at `path`, or `WeightUnavailable` when it cannot
    /// be determined
    fn weight(&self, path: &PagePath) -> Result<u64>;
}

impl<W: WeightSource + ?Sized> WeightSource for &W {
    fn weight(&self, path: &PagePath) -> Result<u64> {
        (**self).weight(path)
    }
}

impl<W: WeightSource + ?Sized> WeightSource for Box<W> {
    fn weight(&self, path: &PagePath) -> Result<u64> {
        (**self).weight(path)
    }
}

/// Fixed weight table, with an optional fallback for unknown paths
#[derive(Clone, Debug, Default)]
pub struct StaticWeights {
    weights: HashMap<PagePath, u64>,
    fallback: Option<u64>,
}

impl StaticWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every page weighs the same
    pub fn uniform(weight: u64) -> Self {
        Self {
            weights: HashMap::new(),
            fallback: Some(weight),
        }
    }

    pub fn with(mut self, path: &str, weight: u64) -> Self {
        self.insert(PagePath::parse(path), weight);
        self
    }

    pub fn with_fallback(mut self, weight: u64) -> Self {
        self.fallback = Some(weight);
        self
    }

    pub fn insert(&mut self, path: PagePath, weight: u64) {
        self.weights.insert(path, weight);
    }
}

impl WeightSource for StaticWeights {
    fn weight(&self, path: &PagePath) -> Result<u64> {
        self.weights
            .get(path)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| PartitionError::weight_unavailable(path, "no weight known for page"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_static_weights() {
        let weights = StaticWeights::new().with("A.B", 42);
        assert_eq!(weights.weight(&PagePath::parse("A.B")), Ok(42));

        let err = weights.weight(&PagePath::parse("A.C")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::WeightUnavailable);
    }

    #[test]
    fn test_static_weights_fallback() {
        let weights = StaticWeights::new().with("A.B", 42).with_fallback(1);
        assert_eq!(weights.weight(&PagePath::parse("A.C")), Ok(1));
        assert_eq!(StaticWeights::uniform(7).weight(&PagePath::parse("X")), Ok(7));
    }
}
