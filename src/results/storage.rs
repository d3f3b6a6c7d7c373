//! Page history storage
//!
//! One JSON file per executed page per run, under a directory per page:
//! `<base>/<page path>/<run id>.json`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::models::{ContextOutcome, PageOutcome, PagePath, PageStatus};

/// Directory name used for the tree root, whose path is empty
const ROOT_DIR_NAME: &str = "_root";

/// One recorded page execution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPageResult {
    /// Page that was executed
    pub page: PagePath,

    /// Root of the context the page ran in
    pub root: PagePath,

    /// Run the execution belongs to
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    pub duration_ms: u64,

    pub status: PageStatus,
}

impl StoredPageResult {
    pub fn from_outcome(run_id: &str, root: &PagePath, outcome: &PageOutcome) -> Self {
        Self {
            page: outcome.page.clone(),
            root: root.clone(),
            run_id: run_id.to_string(),
            started_at: outcome.started_at,
            duration_ms: outcome.duration_ms,
            status: outcome.status,
        }
    }
}

/// Every recorded execution of one page, oldest first
#[derive(Clone, Debug)]
pub struct PageHistory {
    page: PagePath,
    records: Vec<StoredPageResult>,
}

impl PageHistory {
    pub fn new(page: PagePath, mut records: Vec<StoredPageResult>) -> Self {
        records.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Self { page, records }
    }

    pub fn page(&self) -> &PagePath {
        &self.page
    }

    pub fn records(&self) -> &[StoredPageResult] {
        &self.records
    }

    /// Most recently started execution
    pub fn latest(&self) -> Option<&StoredPageResult> {
        self.records.last()
    }

    /// Mean runtime, `None` without records
    pub fn average_duration_ms(&self) -> Option<u64> {
        if self.records.is_empty() {
            return None;
        }
        // the mean of u64 values always fits in u64, only the sum needs widening
        let total: u128 = self.records.iter().map(|r| u128::from(r.duration_ms)).sum();
        u64::try_from(total / self.records.len() as u128).ok()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Generate unique run ID
pub fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Execution history on disk
#[derive(Clone, Debug)]
pub struct HistoryStore {
    base_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store under the user data directory
    pub fn default_dir() -> Self {
        Self::new(default_history_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding the records of one page.
    ///
    /// Always a direct child of the base directory. A path that would name
    /// anything else, such as an absolute path or one with a separator in a
    /// segment, is rejected.
    pub fn page_dir(&self, page: &PagePath) -> Result<PathBuf> {
        if page.is_root() {
            return Ok(self.base_dir.join(ROOT_DIR_NAME));
        }

        let name = page.to_string();
        if name == ROOT_DIR_NAME || !is_plain_name(&name) {
            bail!("Page path '{name}' cannot be stored in the history");
        }
        Ok(self.base_dir.join(name))
    }

    /// Save one page execution
    pub fn record(&self, result: &StoredPageResult) -> Result<PathBuf> {
        if !is_plain_name(&result.run_id) {
            bail!("Invalid run id '{}'", result.run_id);
        }

        let page_dir = self.page_dir(&result.page)?;
        fs::create_dir_all(&page_dir)
            .with_context(|| format!("Failed to create {}", page_dir.display()))?;

        let path = page_dir.join(format!("{}.json", result.run_id));
        let file = File::create(&path).context("Failed to create history file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, result).context("Failed to write history")?;

        debug!("Recorded {} to {}", result.page, path.display());
        Ok(path)
    }

    /// Save the executed pages of a context, fixture pages included. Pages
    /// that errored before or while running did not produce a usable runtime
    /// and are skipped.
    pub fn record_context(&self, run_id: &str, outcome: &ContextOutcome) -> Result<usize> {
        let mut recorded = 0;
        for page in outcome.executed() {
            if page.status == PageStatus::Error {
                continue;
            }
            self.record(&StoredPageResult::from_outcome(run_id, &outcome.root, page))?;
            recorded += 1;
        }
        Ok(recorded)
    }

    /// Load the history of one page.
    ///
    /// `Ok(None)` when the page was never recorded. A record that cannot be
    /// read or parsed is an error rather than being skipped.
    pub fn page_history(&self, page: &PagePath) -> Result<Option<PageHistory>> {
        let page_dir = self.page_dir(page)?;
        if !page_dir.is_dir() {
            return Ok(None);
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&page_dir)
            .with_context(|| format!("Failed to read {}", page_dir.display()))?
        {
            let path = entry?.path();
            if is_json_file(&path) {
                records.push(load_record(&path)?);
            }
        }

        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(PageHistory::new(page.clone(), records)))
    }

    /// Pages with recorded history, in path order
    pub fn list_pages(&self) -> Result<Vec<PagePath>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(ROOT_DIR_NAME) => pages.push(PagePath::root()),
                Some(name) if is_plain_name(name) => pages.push(PagePath::parse(name)),
                _ => debug!("Skipping foreign entry {}", entry.path().display()),
            }
        }

        pages.sort();
        Ok(pages)
    }

    /// Every stored record, by page then start time
    pub fn all_records(&self) -> Result<Vec<StoredPageResult>> {
        let mut records = Vec::new();
        for page in self.list_pages()? {
            if let Some(history) = self.page_history(&page)? {
                records.extend(history.records);
            }
        }
        Ok(records)
    }

    /// Delete the history of one page, returning whether any existed
    pub fn clear_page(&self, page: &PagePath) -> Result<bool> {
        let page_dir = self.page_dir(page)?;
        if !page_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&page_dir)
            .with_context(|| format!("Failed to delete {}", page_dir.display()))?;
        info!("Deleted history for page: {page}");
        Ok(true)
    }

    /// Delete all history, returning the number of pages cleared
    pub fn clear_all(&self) -> Result<usize> {
        let pages = self.list_pages()?;
        for page in &pages {
            self.clear_page(page)?;
        }
        Ok(pages.len())
    }

    /// Write records to a file
    pub fn export(
        &self,
        records: &[StoredPageResult],
        path: &Path,
        format: ExportFormat,
    ) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let writer = BufWriter::new(file);
                serde_json::to_writer_pretty(writer, records)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;

                writer.write_record([
                    "page",
                    "root",
                    "run_id",
                    "started_at",
                    "duration_ms",
                    "status",
                ])?;

                for record in records {
                    writer.write_record([
                        record.page.to_string(),
                        record.root.to_string(),
                        record.run_id.clone(),
                        record.started_at.to_rfc3339(),
                        record.duration_ms.to_string(),
                        record.status.to_string(),
                    ])?;
                }
                writer.flush()?;
            }
        }

        info!("Exported {} records to {}", records.len(), path.display());
        Ok(())
    }
}

/// `<data dir>/suite-splitter/history`, or `./history` without a data dir
pub fn default_history_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("suite-splitter"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("history")
}

/// A single plain, non-hidden path component
fn is_plain_name(name: &str) -> bool {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(|c: char| c == '/' || c == '\\')
    {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn is_json_file(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

fn load_record(path: &Path) -> Result<StoredPageResult> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open history file {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse history file {}", path.display()))
}

/// Export format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionContext, Page, PageId};
    use chrono::Duration;
    use tempfile::tempdir;

    fn stored(page: &str, run_id: &str, minutes_ago: i64, duration_ms: u64) -> StoredPageResult {
        StoredPageResult {
            page: PagePath::parse(page),
            root: PagePath::parse("Suite"),
            run_id: run_id.to_string(),
            started_at: Utc::now() - Duration::minutes(minutes_ago),
            duration_ms,
            status: PageStatus::Pass,
        }
    }

    #[test]
    fn test_generate_run_id() {
        let id = generate_run_id();
        assert_eq!(id.len(), "20240101_000000_0000".len());
        assert!(id.contains('_'));
    }

    #[test]
    fn test_record_and_load() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        let path = store.record(&stored("Suite.Test", "run_1", 5, 1200)).unwrap();
        assert_eq!(path, dir.path().join("Suite.Test").join("run_1.json"));

        let history = store.page_history(&PagePath::parse("Suite.Test")).unwrap().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.records()[0].duration_ms, 1200);
        assert_eq!(history.page().to_string(), "Suite.Test");
    }

    #[test]
    fn test_history_sorted_oldest_first() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        store.record(&stored("Suite.Test", "run_b", 1, 300)).unwrap();
        store.record(&stored("Suite.Test", "run_a", 60, 100)).unwrap();
        store.record(&stored("Suite.Test", "run_c", 30, 200)).unwrap();

        let history = store.page_history(&PagePath::parse("Suite.Test")).unwrap().unwrap();
        let durations: Vec<u64> = history.records().iter().map(|r| r.duration_ms).collect();
        assert_eq!(durations, vec![100, 200, 300]);
        assert_eq!(history.latest().map(|r| r.run_id.as_str()), Some("run_b"));
        assert_eq!(history.average_duration_ms(), Some(200));
    }

    #[test]
    fn test_missing_history() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("absent"));
        assert!(store.page_history(&PagePath::parse("Never.Ran")).unwrap().is_none());
        assert!(store.list_pages().unwrap().is_empty());

        // a page directory without records counts as no history
        fs::create_dir_all(dir.path().join("Empty.Page")).unwrap();
        let store = HistoryStore::new(dir.path());
        assert!(store.page_history(&PagePath::parse("Empty.Page")).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_record_is_error() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        store.record(&stored("Suite.Test", "run_ok", 1, 10)).unwrap();
        fs::write(dir.path().join("Suite.Test").join("broken.json"), "{").unwrap();

        assert!(store.page_history(&PagePath::parse("Suite.Test")).is_err());
    }

    #[test]
    fn test_list_and_clear() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        store.record(&stored("B.Two", "r", 1, 1)).unwrap();
        store.record(&stored("A.One", "r", 1, 1)).unwrap();

        let pages: Vec<String> =
            store.list_pages().unwrap().iter().map(|p| p.to_string()).collect();
        assert_eq!(pages, vec!["A.One", "B.Two"]);

        assert!(store.clear_page(&PagePath::parse("A.One")).unwrap());
        assert!(!store.clear_page(&PagePath::parse("A.One")).unwrap());
        assert_eq!(store.clear_all().unwrap(), 1);
        assert!(store.list_pages().unwrap().is_empty());
    }

    #[test]
    fn test_average_of_large_durations() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let half = u64::MAX / 2 + 1;
        store.record(&stored("Suite.Slow", "run_1", 2, half)).unwrap();
        store.record(&stored("Suite.Slow", "run_2", 1, half)).unwrap();

        let history = store.page_history(&PagePath::parse("Suite.Slow")).unwrap().unwrap();
        assert_eq!(history.average_duration_ms(), Some(half));
    }

    #[test]
    fn test_page_paths_stay_inside_store() {
        let base = tempdir().unwrap();
        let victim = tempdir().unwrap();
        fs::write(victim.path().join("keep.txt"), "data").unwrap();
        let store = HistoryStore::new(base.path().join("history"));

        let escapes = [
            PagePath::parse("/abs/dir"),
            PagePath::parse(&victim.path().display().to_string()),
            PagePath::parse("Dir\\Page"),
            PagePath::root().child(".."),
            PagePath::root().child("_root"),
        ];
        for page in &escapes {
            assert!(store.page_dir(page).is_err(), "{page} accepted");
            assert!(store.clear_page(page).is_err());
            assert!(store.page_history(page).is_err());
            let mut result = stored("Suite.Test", "run_1", 1, 10);
            result.page = page.clone();
            assert!(store.record(&result).is_err());
        }
        assert!(victim.path().join("keep.txt").exists());

        let mut result = stored("Suite.Test", "../run", 1, 10);
        assert!(store.record(&result).is_err());
        result.run_id = "run_1".to_string();
        assert!(store.record(&result).is_ok());
        let root_dir = store.page_dir(&PagePath::root()).unwrap();
        assert_eq!(root_dir, base.path().join("history").join("_root"));
    }

    #[test]
    fn test_list_pages_skips_hidden_entries() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        store.record(&stored("Suite.Test", "r", 1, 1)).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();

        let pages = store.list_pages().unwrap();
        assert_eq!(pages, vec![PagePath::parse("Suite.Test")]);
    }

    #[test]
    fn test_record_context_skips_errors() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let context = ExecutionContext::new(
            Page::new(PageId(1), PagePath::parse("Suite")),
            Vec::new(),
            0,
        );
        let outcome = ContextOutcome::new(
            0,
            &context,
            vec![
                PageOutcome::pass(PagePath::parse("Suite.One"), 40),
                PageOutcome::fail(PagePath::parse("Suite.Two"), 60, "exit status 1"),
                PageOutcome::error(PagePath::parse("Suite.Three"), 0, "timed out"),
            ],
        )
        .with_fixtures(
            Some(PageOutcome::pass(PagePath::parse("Suite.SuiteSetUp"), 15)),
            Some(PageOutcome::error(PagePath::parse("Suite.SuiteTearDown"), 0, "timed out")),
        );

        assert_eq!(store.record_context("run_x", &outcome).unwrap(), 3);
        let records = store.all_records().unwrap();
        assert_eq!(records.len(), 3);
        let setup = store.page_history(&PagePath::parse("Suite.SuiteSetUp")).unwrap().unwrap();
        assert_eq!(setup.latest().map(|r| r.duration_ms), Some(15));
        assert!(store.page_history(&PagePath::parse("Suite.SuiteTearDown")).unwrap().is_none());
        assert!(records.iter().all(|r| r.root.to_string() == "Suite"));
        assert!(store.page_history(&PagePath::parse("Suite.Three")).unwrap().is_none());
    }

    #[test]
    fn test_export_csv_and_json() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history"));
        let records = vec![
            stored("Suite.One", "run_1", 2, 10),
            stored("Suite.Two", "run_1", 1, 20),
        ];

        let csv_path = dir.path().join("out.csv");
        store.export(&records, &csv_path, ExportFormat::Csv).unwrap();
        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "Suite.Two");
        assert_eq!(&rows[1][5], "PASS");

        let json_path = dir.path().join("out.json");
        store.export(&records, &json_path, ExportFormat::Json).unwrap();
        let loaded: Vec<StoredPageResult> =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::from_str("JSON"), Some(ExportFormat::Json));
        assert_eq!(
            ExportFormat::from_extension(Path::new("history.csv")),
            Some(ExportFormat::Csv)
        );
        assert!(ExportFormat::from_str("xml").is_none());
    }
}
