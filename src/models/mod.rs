//! Data models for suite partitioning
//!
//! Page paths and handles, fixture pairs, weighted groups, the execution
//! contexts handed to workers and the outcomes they report back.

mod group;
mod outcome;
mod page;
mod path;

pub use group::{ExecutionContext, FixturePair, WeightedGroup, WeightedPage};
pub use outcome::{ContextOutcome, PageOutcome, PageStatus};
pub use page::{Page, PageId, PageType};
pub use path::PagePath;
