//! Execution outcomes
//!
//! Results reported back by the dispatcher for each page and context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ExecutionContext, PagePath};

/// Page execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Pass,
    Fail,
    Error,
}

impl PageStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            PageStatus::Pass => "✓",
            PageStatus::Fail => "✗",
            PageStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageStatus::Pass)
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStatus::Pass => write!(f, "PASS"),
            PageStatus::Fail => write!(f, "FAIL"),
            PageStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of running a single page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageOutcome {
    pub page: PagePath,
    pub status: PageStatus,
    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl PageOutcome {
    pub fn pass(page: PagePath, duration_ms: u64) -> Self {
        Self {
            page,
            status: PageStatus::Pass,
            started_at: Utc::now(),
            duration_ms,
            message: None,
        }
    }

    pub fn fail(page: PagePath, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            page,
            status: PageStatus::Fail,
            started_at: Utc::now(),
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn error(page: PagePath, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            page,
            status: PageStatus::Error,
            started_at: Utc::now(),
            duration_ms,
            message: Some(error.into()),
        }
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.page,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Results of one execution context, in page order.
///
/// The counts cover the test pages only. Fixture outcomes are kept apart
/// but still decide whether the context passed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextOutcome {
    pub worker: usize,
    pub root: PagePath,
    pub estimated_weight: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub total_duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<PageOutcome>,
    pub pages: Vec<PageOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown: Option<PageOutcome>,
}

impl ContextOutcome {
    pub fn new(worker: usize, context: &ExecutionContext, pages: Vec<PageOutcome>) -> Self {
        let count = |status: PageStatus| pages.iter().filter(|p| p.status == status).count();

        Self {
            worker,
            root: context.root.path().clone(),
            estimated_weight: context.total_weight,
            total: pages.len(),
            passed: count(PageStatus::Pass),
            failed: count(PageStatus::Fail),
            errors: count(PageStatus::Error),
            total_duration_ms: total_duration(&pages),
            setup: None,
            pages,
            teardown: None,
        }
    }

    /// Attach the outcomes of the suite setup and teardown pages
    pub fn with_fixtures(
        mut self,
        setup: Option<PageOutcome>,
        teardown: Option<PageOutcome>,
    ) -> Self {
        self.setup = setup;
        self.teardown = teardown;
        self.total_duration_ms = self
            .executed()
            .fold(0, |total: u64, p| total.saturating_add(p.duration_ms));
        self
    }

    /// Every executed page in run order: setup, test pages, teardown
    pub fn executed(&self) -> impl Iterator<Item = &PageOutcome> {
        self.setup.iter().chain(&self.pages).chain(&self.teardown)
    }

    pub fn fixtures_passed(&self) -> bool {
        self.setup
            .iter()
            .chain(&self.teardown)
            .all(|p| p.status.is_success())
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total && self.fixtures_passed()
    }
}

fn total_duration(pages: &[PageOutcome]) -> u64 {
    pages
        .iter()
        .fold(0, |total: u64, p| total.saturating_add(p.duration_ms))
}

impl fmt::Display for ContextOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = if self.root.is_root() {
            "(root)".to_string()
        } else {
            self.root.to_string()
        };
        writeln!(f, "Context {} - {}", self.worker + 1, root)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for page in self.executed() {
            writeln!(f, "  {page}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {}",
            self.total, self.passed, self.failed, self.errors
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms (estimated {})",
            self.pass_rate(),
            self.total_duration_ms,
            self.estimated_weight
        )
    }
}
