//! End-to-end partitioning through the public API

use std::collections::BTreeSet;

use chrono::Utc;
use suite_splitter::executor::{CommandTemplate, ContextDispatcher, PageRunner};
use suite_splitter::results::{HistoryStore, StoredPageResult};
use suite_splitter::{
    ContextGenerator, HistoryWeightSource, LoadBalancingStrategy, Page, PagePath, PageStatus,
    PageTree, RuntimeStrategy, TreeManifest,
};
use tempfile::tempdir;

const MANIFEST: &str = r#"
pages:
  - path: FrontPage
    type: suite
  - path: FrontPage.SuiteSetUp
  - path: FrontPage.SuiteTearDown
  - path: FrontPage.Login
    type: suite
  - path: FrontPage.Login.ValidUser
    type: test
  - path: FrontPage.Login.InvalidUser
    type: test
  - path: FrontPage.Login.LockedOut
    type: test
  - path: FrontPage.Reports
    type: suite
  - path: FrontPage.Reports.SuiteSetUp
  - path: FrontPage.Reports.Daily
    type: test
  - path: FrontPage.Reports.Monthly
    type: test
  - path: Sandbox.Scratch
    type: test
"#;

fn record(store: &HistoryStore, page: &str, duration_ms: u64) {
    store
        .record(&StoredPageResult {
            page: PagePath::parse(page),
            root: PagePath::parse("FrontPage"),
            run_id: "20240101_000000_0001".to_string(),
            started_at: Utc::now(),
            duration_ms,
            status: PageStatus::Pass,
        })
        .unwrap();
}

#[test]
fn test_manifest_history_to_contexts() {
    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join("pages.yaml");
    std::fs::write(&manifest_path, MANIFEST).unwrap();
    let tree = TreeManifest::load(&manifest_path).unwrap().build().unwrap();

    let store = HistoryStore::new(dir.path().join("history"));
    record(&store, "FrontPage.SuiteSetUp", 1_000);
    record(&store, "FrontPage.SuiteTearDown", 500);
    record(&store, "FrontPage.Reports.SuiteSetUp", 2_000);
    record(&store, "FrontPage.Login.ValidUser", 40_000);
    record(&store, "FrontPage.Login.InvalidUser", 30_000);
    record(&store, "FrontPage.Login.LockedOut", 20_000);
    record(&store, "FrontPage.Reports.Daily", 5_000);
    record(&store, "FrontPage.Reports.Monthly", 6_000);

    let suite = tree.resolve(&PagePath::parse("FrontPage")).unwrap();
    let pages = tree.test_pages_under(&suite);
    assert_eq!(pages.len(), 5);

    let weights = HistoryWeightSource::new(store, RuntimeStrategy::Latest);
    let generator = ContextGenerator::new(&tree, weights)
        .with_strategy(Box::new(LoadBalancingStrategy::new(50_000)));
    let contexts = generator.generate(pages.clone(), 2).unwrap();

    // Login (91500 > 50000) splits in two; Reports (13500) stays whole
    assert_eq!(contexts.len(), 3);
    let totals: Vec<u64> = contexts.iter().map(|c| c.total_weight).collect();
    assert_eq!(totals, vec![51_500, 41_500, 13_500]);

    let login = PagePath::parse("FrontPage.Login");
    assert_eq!(contexts[0].root.path(), &login);
    assert_eq!(contexts[1].root.path(), &login);
    assert_eq!(contexts[2].root.path(), &PagePath::parse("FrontPage.Reports"));

    let produced: Vec<Page> = contexts.iter().flat_map(|c| c.pages.clone()).collect();
    let unique: BTreeSet<Page> = produced.iter().cloned().collect();
    let expected: BTreeSet<Page> = pages.into_iter().collect();
    assert_eq!(produced.len(), expected.len());
    assert_eq!(unique, expected);
}

#[test]
fn test_unrecorded_pages_weigh_default() {
    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join("pages.yaml");
    std::fs::write(&manifest_path, MANIFEST).unwrap();
    let tree = TreeManifest::load(&manifest_path).unwrap().build().unwrap();

    let store = HistoryStore::new(dir.path().join("empty"));
    let weights = HistoryWeightSource::new(store, RuntimeStrategy::Average);
    let err = ContextGenerator::new(&tree, weights)
        .generate(tree.test_pages_under(&tree.root()), 4)
        .unwrap_err();

    // Sandbox has no suite above it
    assert!(err.is_recoverable());

    let store = HistoryStore::new(dir.path().join("empty"));
    let weights = HistoryWeightSource::new(store, RuntimeStrategy::Average);
    let contexts = ContextGenerator::new(&tree, weights)
        .enforce_suite_root(false)
        .generate(tree.test_pages_under(&tree.root()), 4)
        .unwrap();

    let total: u64 = contexts.iter().map(|c| c.total_weight).sum();
    // six pages plus the two fixtures of Login and of Reports, one each
    assert_eq!(contexts.iter().map(|c| c.len()).sum::<usize>(), 6);
    assert_eq!(total, 6 + 2 + 2);
}

#[tokio::test]
async fn test_fixture_weights_come_from_recorded_runs() {
    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join("pages.yaml");
    std::fs::write(&manifest_path, MANIFEST).unwrap();
    let tree = TreeManifest::load(&manifest_path).unwrap().build().unwrap();
    let history = dir.path().join("history");

    let reports = tree.resolve(&PagePath::parse("FrontPage.Reports")).unwrap();
    let pages = tree.test_pages_under(&reports);

    // nothing recorded yet: two pages and two fixtures at the default weight
    let weights = HistoryWeightSource::new(HistoryStore::new(&history), RuntimeStrategy::Latest)
        .with_default_weight(1_000_000);
    let contexts = ContextGenerator::new(&tree, weights).generate(pages.clone(), 1).unwrap();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].total_weight, 4_000_000);

    let runner = PageRunner::new(CommandTemplate::new("true").unwrap());
    let outcomes = ContextDispatcher::new(runner, 1).dispatch(contexts).await.unwrap();
    let store = HistoryStore::new(&history);
    let recorded = store.record_context("20240101_000000_0002", &outcomes[0]).unwrap();
    assert_eq!(recorded, 4);

    let mut expected = 0;
    for page in [
        "FrontPage.Reports.SuiteSetUp",
        "FrontPage.Reports.Daily",
        "FrontPage.Reports.Monthly",
        "FrontPage.SuiteTearDown",
    ] {
        let runs = store.page_history(&PagePath::parse(page)).unwrap().unwrap();
        expected += runs.latest().unwrap().duration_ms;
    }

    let weights =
        HistoryWeightSource::new(store, RuntimeStrategy::Latest).with_default_weight(1_000_000);
    let contexts = ContextGenerator::new(&tree, weights).generate(pages, 1).unwrap();
    assert_eq!(contexts[0].total_weight, expected);
    assert!(contexts[0].total_weight < 1_000_000);
}
