//! Partitioning errors
//!
//! Every failure aborts the whole `generate` call. Each variant carries the
//! offending path or page set so callers can log it usefully.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::{Page, PagePath};

/// Errors raised while building execution contexts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Unable to determine weight for page '{path}': {reason}")]
    WeightUnavailable { path: PagePath, reason: String },

    #[error("Unable to find common root on path '{path}' for pages {}", list(.pages))]
    CommonRootNotFound { path: PagePath, pages: Vec<PagePath> },

    #[error("Unable to find suite page as common root for pages {}", list(.pages))]
    SuiteRootNotFound { pages: Vec<PagePath> },
}

/// Error category, for callers that switch on the failure reason
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    WeightUnavailable,
    CommonRootNotFound,
    SuiteRootNotFound,
}

impl PartitionError {
    pub fn weight_unavailable(path: &PagePath, reason: impl fmt::Display) -> Self {
        PartitionError::WeightUnavailable {
            path: path.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn common_root_not_found(path: PagePath, pages: &[Page]) -> Self {
        PartitionError::CommonRootNotFound {
            path,
            pages: paths(pages),
        }
    }

    pub fn suite_root_not_found(pages: &[Page]) -> Self {
        PartitionError::SuiteRootNotFound {
            pages: paths(pages),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PartitionError::WeightUnavailable { .. } => FailureKind::WeightUnavailable,
            PartitionError::CommonRootNotFound { .. } => FailureKind::CommonRootNotFound,
            PartitionError::SuiteRootNotFound { .. } => FailureKind::SuiteRootNotFound,
        }
    }

    /// Suite root failures can be retried without suite enforcement; the
    /// others point at broken data or a broken tree.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PartitionError::SuiteRootNotFound { .. })
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::WeightUnavailable => "weight unavailable",
            FailureKind::CommonRootNotFound => "common root not found",
            FailureKind::SuiteRootNotFound => "suite root not found",
        };
        write!(f, "{name}")
    }
}

fn paths(pages: &[Page]) -> Vec<PagePath> {
    pages.iter().map(|p| p.path().clone()).collect()
}

fn list(pages: &[PagePath]) -> String {
    let names: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
    format!("[{}]", names.join(", "))
}

pub type Result<T> = std::result::Result<T, PartitionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageId;

    #[test]
    fn test_error_messages_carry_context() {
        let pages = vec![
            Page::new(PageId(1), PagePath::parse("Static.TestOne")),
            Page::new(PageId(2), PagePath::parse("Static.TestTwo")),
        ];

        let err = PartitionError::suite_root_not_found(&pages);
        assert_eq!(
            err.to_string(),
            "Unable to find suite page as common root for pages [Static.TestOne, Static.TestTwo]"
        );
        assert_eq!(err.kind(), FailureKind::SuiteRootNotFound);
        assert!(err.is_recoverable());

        let err = PartitionError::weight_unavailable(&PagePath::parse("A.B"), "corrupt record");
        assert_eq!(
            err.to_string(),
            "Unable to determine weight for page 'A.B': corrupt record"
        );
        assert!(!err.is_recoverable());
    }
}
