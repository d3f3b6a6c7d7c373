//! Weighted group construction

use std::collections::BTreeMap;
use tracing::debug;

use super::WeightSource;
use crate::error::Result;
use crate::models::{FixturePair, Page, PagePath, WeightedGroup, WeightedPage};

/// Attaches weights to grouped pages and their fixture pages
pub struct WeightedGroupBuilder<W> {
    source: W,
}

impl<W: WeightSource> WeightedGroupBuilder<W> {
    pub fn new(source: W) -> Self {
        Self { source }
    }

    /// One group per map entry, in map order. The first weight failure
    /// aborts the whole build.
    pub fn build(&self, groups: &BTreeMap<FixturePair, Vec<Page>>) -> Result<Vec<WeightedGroup>> {
        groups
            .iter()
            .map(|(fixtures, pages)| self.build_group(fixtures, pages))
            .collect()
    }

    fn build_group(&self, fixtures: &FixturePair, pages: &[Page]) -> Result<WeightedGroup> {
        let setup_weight = self.fixture_weight(fixtures.setup())?;
        let teardown_weight = self.fixture_weight(fixtures.teardown())?;

        let weighted = pages
            .iter()
            .map(|page| {
                self.source
                    .weight(page.path())
                    .map(|weight| WeightedPage::new(page.clone(), weight))
            })
            .collect::<Result<Vec<_>>>()?;

        let group = WeightedGroup::new(fixtures.clone(), weighted, setup_weight, teardown_weight);
        debug!(
            "Weighted group {}: {} pages, total weight {}",
            fixtures,
            group.len(),
            group.total_weight()
        );
        Ok(group)
    }

    /// Absent fixtures weigh nothing and are never queried
    fn fixture_weight(&self, path: Option<&PagePath>) -> Result<u64> {
        match path {
            Some(path) => self.source.weight(path),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PartitionError;
    use crate::models::PageType;
    use crate::tree::{PageTree, WikiTree};
    use crate::weight::StaticWeights;
    use std::cell::RefCell;

    /// Records every queried path
    struct Recording<W> {
        inner: W,
        queried: RefCell<Vec<String>>,
    }

    impl<W: WeightSource> WeightSource for Recording<W> {
        fn weight(&self, path: &PagePath) -> Result<u64> {
            self.queried.borrow_mut().push(path.to_string());
            self.inner.weight(path)
        }
    }

    #[test]
    fn test_build() {
        let mut tree = WikiTree::new();
        let root = tree.root();
        let one = tree.add_page(&root, "PageOne", PageType::Test).unwrap();
        let two = tree.add_page(&root, "PageTwo", PageType::Test).unwrap();
        let three = tree.add_page(&root, "PageThree", PageType::Test).unwrap();

        let weights = StaticWeights::new()
            .with("SuiteSetUp", 110000)
            .with("SuiteTearDown", 201000)
            .with("PageOne", 300100)
            .with("PageTwo", 400010)
            .with("PageThree", 500001);

        let fixtures = FixturePair::new(
            Some(PagePath::parse("SuiteSetUp")),
            Some(PagePath::parse("SuiteTearDown")),
        );
        let mut map = BTreeMap::new();
        map.insert(fixtures.clone(), vec![one.clone(), two.clone(), three.clone()]);

        let groups = WeightedGroupBuilder::new(&weights).build(&map).unwrap();
        let group = &groups[0];

        assert_eq!(group.fixtures(), &fixtures);
        assert_eq!(
            group.pages(),
            &[
                WeightedPage::new(one, 300100),
                WeightedPage::new(two, 400010),
                WeightedPage::new(three, 500001),
            ]
        );
        assert_eq!(group.setup_weight(), 110000);
        assert_eq!(group.teardown_weight(), 201000);
        assert_eq!(group.pages_weight(), 1200111);
        assert_eq!(group.total_weight(), 1511111);
    }

    #[test]
    fn test_absent_fixtures_weigh_zero_and_are_not_queried() {
        let mut tree = WikiTree::new();
        let page = tree
            .add_path(&PagePath::parse("Loose.Test"), PageType::Test)
            .unwrap();

        let source = Recording {
            inner: StaticWeights::new().with("Loose.Test", 12),
            queried: RefCell::new(Vec::new()),
        };
        let mut map = BTreeMap::new();
        map.insert(FixturePair::none(), vec![page]);

        let groups = WeightedGroupBuilder::new(&source).build(&map).unwrap();
        assert_eq!(groups[0].setup_weight(), 0);
        assert_eq!(groups[0].teardown_weight(), 0);
        assert_eq!(groups[0].total_weight(), 12);
        assert_eq!(*source.queried.borrow(), vec!["Loose.Test".to_string()]);
    }

    #[test]
    fn test_missing_weight_fails_whole_build() {
        let mut tree = WikiTree::new();
        let known = tree.add_path(&PagePath::parse("A.Known"), PageType::Test).unwrap();
        let unknown = tree
            .add_path(&PagePath::parse("B.Unknown"), PageType::Test)
            .unwrap();

        let weights = StaticWeights::new().with("A.Known", 5);
        let mut map = BTreeMap::new();
        map.insert(FixturePair::none(), vec![known]);
        map.insert(
            FixturePair::new(Some(PagePath::parse("B.SuiteSetUp")), None),
            vec![unknown],
        );

        let err = WeightedGroupBuilder::new(&weights).build(&map).unwrap_err();
        match err {
            PartitionError::WeightUnavailable { path, .. } => {
                assert_eq!(path.to_string(), "B.SuiteSetUp")
            }
            other => panic!("Expected WeightUnavailable, got {other:?}"),
        }
    }
}
