//! Timer utilities
//!
//! Elapsed-time measurement for pipeline stages and page runs.

use std::time::{Duration, Instant};

/// Labelled timer started on construction
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed milliseconds, saturating
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Stop and log the elapsed time at debug level
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!("{}: {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}
