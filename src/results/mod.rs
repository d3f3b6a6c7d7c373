//! Execution history
//!
//! Persistent per-page runtimes recorded by `run`, read back as weights for
//! later partitioning.

mod storage;

pub use storage::{
    default_history_dir, generate_run_id, ExportFormat, HistoryStore, PageHistory,
    StoredPageResult,
};
