//! Fixture grouping
//!
//! Pages can only share a worker if they inherit the same suite setup and
//! suite teardown, so the first partitioning step groups pages by that pair.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::models::{FixturePair, Page};
use crate::tree::PageTree;

/// Names of the fixture pages a suite defines as children
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureNames {
    pub setup: String,
    pub teardown: String,
}

impl Default for FixtureNames {
    fn default() -> Self {
        Self {
            setup: "SuiteSetUp".to_string(),
            teardown: "SuiteTearDown".to_string(),
        }
    }
}

/// Maps pages to the fixture pair they inherit
#[derive(Clone, Debug, Default)]
pub struct FixtureGrouper {
    names: FixtureNames,
}

impl FixtureGrouper {
    pub fn new(names: FixtureNames) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &FixtureNames {
        &self.names
    }

    /// Group distinct pages by inherited fixture pair.
    ///
    /// Duplicates are dropped. Groups iterate in fixture-pair order and the
    /// pages of each group in path order.
    pub fn group<T: PageTree>(
        &self,
        tree: &T,
        pages: impl IntoIterator<Item = Page>,
    ) -> BTreeMap<FixturePair, Vec<Page>> {
        let unique: BTreeSet<Page> = pages.into_iter().collect();
        let mut groups: BTreeMap<FixturePair, Vec<Page>> = BTreeMap::new();

        for page in unique {
            let pair = self.fixtures_of(tree, &page);
            groups.entry(pair).or_default().push(page);
        }

        debug!("Grouped pages into {} fixture groups", groups.len());
        groups
    }

    /// The (setup, teardown) pair a single page inherits
    pub fn fixtures_of<T: PageTree>(&self, tree: &T, page: &Page) -> FixturePair {
        let setup = tree.closest_inherited(page, &self.names.setup);
        let teardown = tree.closest_inherited(page, &self.names.teardown);
        FixturePair::new(
            setup.map(|p| tree.full_path(&p)),
            teardown.map(|p| tree.full_path(&p)),
        )
    }
}
