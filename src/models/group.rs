//! Fixture pairs, weighted groups and execution contexts

use serde::Serialize;
use std::fmt;

use super::{Page, PagePath};

/// The suite setup and teardown pages a page inherits.
///
/// Either side may be absent. Absent sorts before present, which keeps the
/// grouping map in a stable order.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FixturePair {
    setup: Option<PagePath>,
    teardown: Option<PagePath>,
}

impl FixturePair {
    pub fn new(setup: Option<PagePath>, teardown: Option<PagePath>) -> Self {
        Self { setup, teardown }
    }

    /// Pair with neither setup nor teardown
    pub fn none() -> Self {
        Self::default()
    }

    pub fn setup(&self) -> Option<&PagePath> {
        self.setup.as_ref()
    }

    pub fn teardown(&self) -> Option<&PagePath> {
        self.teardown.as_ref()
    }
}

impl fmt::Display for FixturePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: Option<&PagePath>| p.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        write!(f, "({}, {})", show(self.setup()), show(self.teardown()))
    }
}

/// A page with its estimated cost
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeightedPage {
    pub page: Page,
    pub weight: u64,
}

impl WeightedPage {
    pub fn new(page: Page, weight: u64) -> Self {
        Self { page, weight }
    }
}

/// Pages sharing one fixture pair, with weights.
///
/// `pages_weight` and `total_weight` are derived on construction and cannot
/// be set independently. Sums saturate at `u64::MAX`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeightedGroup {
    fixtures: FixturePair,
    pages: Vec<WeightedPage>,
    setup_weight: u64,
    teardown_weight: u64,
    pages_weight: u64,
    total_weight: u64,
}

impl WeightedGroup {
    pub fn new(
        fixtures: FixturePair,
        pages: Vec<WeightedPage>,
        setup_weight: u64,
        teardown_weight: u64,
    ) -> Self {
        let pages_weight = pages
            .iter()
            .fold(0, |total: u64, p| total.saturating_add(p.weight));
        Self {
            fixtures,
            pages,
            setup_weight,
            teardown_weight,
            pages_weight,
            total_weight: setup_weight
                .saturating_add(teardown_weight)
                .saturating_add(pages_weight),
        }
    }

    /// Same fixtures and fixture weights, different pages
    pub fn with_pages(&self, pages: Vec<WeightedPage>) -> Self {
        Self::new(
            self.fixtures.clone(),
            pages,
            self.setup_weight,
            self.teardown_weight,
        )
    }

    pub fn fixtures(&self) -> &FixturePair {
        &self.fixtures
    }

    pub fn pages(&self) -> &[WeightedPage] {
        &self.pages
    }

    pub fn setup_weight(&self) -> u64 {
        self.setup_weight
    }

    pub fn teardown_weight(&self) -> u64 {
        self.teardown_weight
    }

    pub fn pages_weight(&self) -> u64 {
        self.pages_weight
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Plain pages, weights stripped
    pub fn plain_pages(&self) -> Vec<Page> {
        self.pages.iter().map(|p| p.page.clone()).collect()
    }
}

/// One unit of work for a single worker: a reporting root, the pages to
/// run under it in order, and the fixture pages they share.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    pub root: Page,
    pub pages: Vec<Page>,
    pub fixtures: FixturePair,
    pub total_weight: u64,
}

impl ExecutionContext {
    pub fn new(root: Page, pages: Vec<Page>, total_weight: u64) -> Self {
        Self {
            root,
            pages,
            fixtures: FixturePair::none(),
            total_weight,
        }
    }

    pub fn with_fixtures(mut self, fixtures: FixturePair) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} pages, weight {}]",
            self.root,
            self.pages.len(),
            self.total_weight
        )
    }
}
