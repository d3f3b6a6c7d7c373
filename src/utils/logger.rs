//! Logging setup
//!
//! The binary logs through `tracing`; the level comes from the config file,
//! the environment or `--verbose`.

use std::fmt;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Filter directive for this crate's events
    pub fn directive(self) -> String {
        format!("suite_splitter={}", self.to_tracing_level())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tracing_level().as_str().to_lowercase())
    }
}

/// Install the global subscriber. Logs go to stderr so that structured
/// output on stdout stays parseable.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::new(level.directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
