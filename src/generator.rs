//! Execution context generation
//!
//! Runs the whole partitioning pipeline for one set of pages: fixture
//! grouping, weighting, partitioning and root resolution. Every stage is
//! synchronous and any failure aborts the call.

use tracing::{debug, info};

use crate::error::Result;
use crate::grouping::{FixtureGrouper, FixtureNames};
use crate::models::{ExecutionContext, Page};
use crate::partition::{LoadBalancingStrategy, PartitionStrategy};
use crate::root::CommonRootResolver;
use crate::tree::PageTree;
use crate::utils::timer::Timer;
use crate::weight::{WeightSource, WeightedGroupBuilder};

/// Groups above this weight are split by default
pub const DEFAULT_LARGE_THRESHOLD: u64 = 300_000;

/// Turns a page set into independent execution contexts
pub struct ContextGenerator<'t, T, W> {
    tree: &'t T,
    weights: W,
    strategy: Box<dyn PartitionStrategy>,
    grouper: FixtureGrouper,
    enforce_suite_root: bool,
}

impl<'t, T: PageTree, W: WeightSource> ContextGenerator<'t, T, W> {
    pub fn new(tree: &'t T, weights: W) -> Self {
        Self {
            tree,
            weights,
            strategy: Box::new(LoadBalancingStrategy::new(DEFAULT_LARGE_THRESHOLD)),
            grouper: FixtureGrouper::default(),
            enforce_suite_root: true,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn PartitionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Require every context root to be a suite page
    pub fn enforce_suite_root(mut self, enforce: bool) -> Self {
        self.enforce_suite_root = enforce;
        self
    }

    pub fn with_fixture_names(mut self, names: FixtureNames) -> Self {
        self.grouper = FixtureGrouper::new(names);
        self
    }

    /// Partition `pages` for `count` workers.
    ///
    /// Contexts come back heaviest first. Every distinct input page appears
    /// in exactly one context.
    pub fn generate(
        &self,
        pages: impl IntoIterator<Item = Page>,
        count: usize,
    ) -> Result<Vec<ExecutionContext>> {
        let timer = Timer::start("generate contexts");

        let grouped = self.grouper.group(self.tree, pages);
        let weighted = WeightedGroupBuilder::new(&self.weights).build(&grouped)?;
        let partitioned = self.strategy.partition(weighted, count);
        debug!(
            "{} fixture groups partitioned into {} units",
            grouped.len(),
            partitioned.len()
        );

        let resolver = CommonRootResolver::new(self.tree);
        let mut contexts = Vec::with_capacity(partitioned.len());
        for group in partitioned {
            let pages = group.plain_pages();
            let Some(root) = resolver.lowest_common_root(&pages, self.enforce_suite_root)? else {
                continue;
            };
            contexts.push(
                ExecutionContext::new(root, pages, group.total_weight())
                    .with_fixtures(group.fixtures().clone()),
            );
        }

        info!(
            "Generated {} execution contexts in {}ms",
            contexts.len(),
            timer.elapsed_ms()
        );
        Ok(contexts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, PartitionError};
    use crate::models::{PagePath, PageType};
    use crate::partition::WholeGroupStrategy;
    use crate::tree::WikiTree;
    use crate::weight::StaticWeights;
    use std::collections::BTreeSet;

    fn suite_tree() -> (WikiTree, Page, Page) {
        let mut tree = WikiTree::new();
        let root = tree.root();
        let suite = tree.add_page(&root, "SuitePage", PageType::Suite).unwrap();
        tree.add_page(&suite, "SuiteSetUp", PageType::Static).unwrap();
        tree.add_page(&suite, "SuiteTearDown", PageType::Static).unwrap();
        let one = tree.add_page(&suite, "TestPageOne", PageType::Test).unwrap();
        let two = tree.add_page(&suite, "TestPageTwo", PageType::Test).unwrap();
        (tree, one, two)
    }

    fn suite_weights() -> StaticWeights {
        StaticWeights::new()
            .with("SuitePage.SuiteSetUp", 110000)
            .with("SuitePage.SuiteTearDown", 201000)
            .with("SuitePage.TestPageOne", 300100)
            .with("SuitePage.TestPageTwo", 400010)
    }

    #[test]
    fn test_single_suite_context() {
        let (tree, one, two) = suite_tree();
        let generator = ContextGenerator::new(&tree, suite_weights())
            .with_strategy(Box::new(LoadBalancingStrategy::new(2_000_000)));

        let contexts = generator.generate(vec![two.clone(), one.clone()], 2).unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].root.path().to_string(), "SuitePage");
        assert_eq!(contexts[0].pages, vec![one, two]);
        assert_eq!(contexts[0].total_weight, 1011110);
        assert_eq!(
            contexts[0].fixtures.setup().map(|p| p.to_string()).as_deref(),
            Some("SuitePage.SuiteSetUp")
        );
        assert_eq!(
            contexts[0].fixtures.teardown().map(|p| p.to_string()).as_deref(),
            Some("SuitePage.SuiteTearDown")
        );
    }

    #[test]
    fn test_large_suite_split_across_workers() {
        let (tree, one, two) = suite_tree();
        let generator = ContextGenerator::new(&tree, suite_weights());

        let contexts = generator.generate(vec![one.clone(), two.clone()], 2).unwrap();
        assert_eq!(contexts.len(), 2);
        // both halves report under the suite so fixtures still apply
        assert!(contexts.iter().all(|c| c.root.path().to_string() == "SuitePage"));
        assert_eq!(contexts[0].pages, vec![two]);
        assert_eq!(contexts[0].total_weight, 711010);
        assert_eq!(contexts[1].pages, vec![one]);
        assert_eq!(contexts[1].total_weight, 611100);
    }

    #[test]
    fn test_without_suite_enforcement_root_is_page() {
        let (tree, one, two) = suite_tree();
        let generator = ContextGenerator::new(&tree, suite_weights()).enforce_suite_root(false);

        let contexts = generator.generate(vec![one, two.clone()], 2).unwrap();
        assert_eq!(contexts[0].root, two);
    }

    #[test]
    fn test_empty_input() {
        let (tree, _, _) = suite_tree();
        let generator = ContextGenerator::new(&tree, suite_weights());
        assert_eq!(generator.generate(Vec::new(), 4), Ok(Vec::new()));
    }

    #[test]
    fn test_duplicates_run_once() {
        let (tree, one, two) = suite_tree();
        let generator = ContextGenerator::new(&tree, suite_weights())
            .with_strategy(Box::new(WholeGroupStrategy));

        let contexts = generator
            .generate(vec![one.clone(), two.clone(), one.clone()], 4)
            .unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].pages, vec![one, two]);
    }

    #[test]
    fn test_weight_failure_aborts() {
        let (tree, one, two) = suite_tree();
        let weights = StaticWeights::new().with("SuitePage.TestPageOne", 1);
        let generator = ContextGenerator::new(&tree, weights);

        let err = generator.generate(vec![one, two], 2).unwrap_err();
        assert_eq!(err.kind(), FailureKind::WeightUnavailable);
    }

    #[test]
    fn test_missing_suite_root_aborts() {
        let mut tree = WikiTree::new();
        let page = tree
            .add_path(&PagePath::parse("Static.Test"), PageType::Test)
            .unwrap();
        let generator = ContextGenerator::new(&tree, StaticWeights::uniform(1));

        let err = generator.generate(vec![page.clone()], 1).unwrap_err();
        assert!(matches!(err, PartitionError::SuiteRootNotFound { .. }));
        assert!(err.is_recoverable());

        let contexts = ContextGenerator::new(&tree, StaticWeights::uniform(1))
            .enforce_suite_root(false)
            .generate(vec![page.clone()], 1)
            .unwrap();
        assert_eq!(contexts[0].root, page);
    }

    #[test]
    fn test_custom_fixture_names() {
        let mut tree = WikiTree::new();
        let a = tree.add_path(&PagePath::parse("A"), PageType::Suite).unwrap();
        tree.add_page(&a, "Before", PageType::Static).unwrap();
        let one = tree.add_page(&a, "One", PageType::Test).unwrap();

        let names = FixtureNames {
            setup: "Before".to_string(),
            teardown: "After".to_string(),
        };
        let weights = StaticWeights::new().with("A.Before", 7).with("A.One", 3);
        let contexts = ContextGenerator::new(&tree, weights)
            .with_fixture_names(names)
            .generate(vec![one], 1)
            .unwrap();
        assert_eq!(contexts[0].total_weight, 10);
    }

    #[test]
    fn test_every_page_in_exactly_one_context() {
        let mut tree = WikiTree::new();
        let mut pages = Vec::new();
        for suite in ["Alpha", "Beta", "Gamma"] {
            let s = tree.add_path(&PagePath::parse(suite), PageType::Suite).unwrap();
            if suite != "Gamma" {
                tree.add_page(&s, "SuiteSetUp", PageType::Static).unwrap();
            }
            for i in 0..11 {
                let path = PagePath::parse(&format!("{suite}.Group{}.Test{i}", i % 3));
                let nested = tree.add_path(&path, PageType::Test).unwrap();
                pages.push(nested);
            }
        }

        let generator = ContextGenerator::new(&tree, StaticWeights::uniform(50_000));
        let contexts = generator.generate(pages.clone(), 3).unwrap();

        let produced: Vec<Page> = contexts.iter().flat_map(|c| c.pages.clone()).collect();
        let unique: BTreeSet<Page> = produced.iter().cloned().collect();
        let expected: BTreeSet<Page> = pages.into_iter().collect();
        assert_eq!(produced.len(), expected.len());
        assert_eq!(unique, expected);

        for context in &contexts {
            assert!(tree.is_suite(&context.root));
            for page in &context.pages {
                assert!(page.path().starts_with(context.root.path()));
            }
        }

        let totals: Vec<u64> = contexts.iter().map(|c| c.total_weight).collect();
        assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    }
}
