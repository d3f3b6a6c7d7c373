//! Context execution engine
//!
//! Runs generated execution contexts against an external command, one task
//! per context.

mod parallel;
mod runner;

pub use parallel::ContextDispatcher;
pub use runner::{CommandTemplate, PageRunner, DEFAULT_PAGE_TIMEOUT};
