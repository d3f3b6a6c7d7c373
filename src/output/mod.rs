//! Output formatting module
//!
//! Renders execution contexts, run outcomes and page history.

mod formatter;

pub use formatter::{ContextFormatter, OutputFormat};
