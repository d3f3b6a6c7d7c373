//! Output formatters for contexts and run outcomes
//!
//! Provides Table, JSON, CSV and summary output formats.

use serde::Serialize;

use crate::models::{ContextOutcome, ExecutionContext, PageStatus};
use crate::results::PageHistory;

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Renders contexts, outcomes and history
pub struct ContextFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ContextFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format generated execution contexts
    pub fn format_contexts(&self, contexts: &[ExecutionContext]) -> String {
        match self.format {
            OutputFormat::Table => self.format_contexts_table(contexts),
            OutputFormat::Json => to_json(contexts, false),
            OutputFormat::JsonPretty => to_json(contexts, true),
            OutputFormat::Csv => self.format_contexts_csv(contexts),
            OutputFormat::Summary => self.format_contexts_summary(contexts),
        }
    }

    fn format_contexts_table(&self, contexts: &[ExecutionContext]) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║  {:<58}  ║\n",
            format!("Execution Contexts ({})", contexts.len())
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        for (i, context) in contexts.iter().enumerate() {
            output.push_str(&format!(
                "\n[{}] {}  weight {}  ({} pages)\n",
                i + 1,
                display_root(context),
                context.total_weight,
                context.len()
            ));
            for page in &context.pages {
                output.push_str(&format!("    {page}\n"));
            }
        }

        output
    }

    fn format_contexts_csv(&self, contexts: &[ExecutionContext]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let _ = writer.write_record(["context", "root", "page", "context_weight"]);
        for (i, context) in contexts.iter().enumerate() {
            for page in &context.pages {
                let _ = writer.write_record([
                    (i + 1).to_string(),
                    context.root.path().to_string(),
                    page.path().to_string(),
                    context.total_weight.to_string(),
                ]);
            }
        }
        csv_string(writer)
    }

    fn format_contexts_summary(&self, contexts: &[ExecutionContext]) -> String {
        let pages: usize = contexts.iter().map(|c| c.len()).sum();
        let heaviest = contexts.iter().map(|c| c.total_weight).max().unwrap_or(0);
        let lightest = contexts.iter().map(|c| c.total_weight).min().unwrap_or(0);
        format!(
            "{} contexts, {} pages (weight {}..{})",
            contexts.len(),
            pages,
            lightest,
            heaviest
        )
    }

    /// Format the outcomes of a dispatched run
    pub fn format_outcomes(&self, outcomes: &[ContextOutcome]) -> String {
        match self.format {
            OutputFormat::Table => self.format_outcomes_table(outcomes),
            OutputFormat::Json => to_json(outcomes, false),
            OutputFormat::JsonPretty => to_json(outcomes, true),
            OutputFormat::Csv => self.format_outcomes_csv(outcomes),
            OutputFormat::Summary => self.format_outcomes_summary(outcomes),
        }
    }

    fn format_outcomes_table(&self, outcomes: &[ContextOutcome]) -> String {
        let mut output = String::new();

        for outcome in outcomes {
            let text = outcome.to_string();
            output.push('\n');
            if self.colorize {
                output.push_str(&colorize_statuses(text));
            } else {
                output.push_str(&text);
            }
        }

        output.push('\n');
        output.push_str(&self.format_outcomes_summary(outcomes));
        output.push('\n');
        output
    }

    fn format_outcomes_csv(&self, outcomes: &[ContextOutcome]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let _ = writer.write_record([
            "context",
            "root",
            "page",
            "status",
            "duration_ms",
            "message",
        ]);
        for outcome in outcomes {
            for page in outcome.executed() {
                let _ = writer.write_record([
                    (outcome.worker + 1).to_string(),
                    outcome.root.to_string(),
                    page.page.to_string(),
                    page.status.to_string(),
                    page.duration_ms.to_string(),
                    page.message.clone().unwrap_or_default(),
                ]);
            }
        }
        csv_string(writer)
    }

    fn format_outcomes_summary(&self, outcomes: &[ContextOutcome]) -> String {
        let total: usize = outcomes.iter().map(|o| o.total).sum();
        let passed: usize = outcomes.iter().map(|o| o.passed).sum();
        let failed: usize = outcomes.iter().map(|o| o.failed).sum();
        let errors: usize = outcomes.iter().map(|o| o.errors).sum();
        let slowest = outcomes.iter().map(|o| o.total_duration_ms).max().unwrap_or(0);
        let rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        format!(
            "{} contexts: {}/{} passed, {} failed, {} errors ({:.1}%) - slowest context {}ms",
            outcomes.len(),
            passed,
            total,
            failed,
            errors,
            rate,
            slowest
        )
    }

    /// Format the recorded history of one page
    pub fn format_history(&self, history: &PageHistory) -> String {
        match self.format {
            OutputFormat::Json => to_json(history.records(), false),
            OutputFormat::JsonPretty => to_json(history.records(), true),
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                let _ = writer.write_record(["run_id", "started_at", "duration_ms", "status"]);
                for record in history.records() {
                    let _ = writer.write_record([
                        record.run_id.clone(),
                        record.started_at.to_rfc3339(),
                        record.duration_ms.to_string(),
                        record.status.to_string(),
                    ]);
                }
                csv_string(writer)
            }
            OutputFormat::Summary => format!(
                "{}: {} runs, average {}ms, latest {}ms",
                history.page(),
                history.len(),
                history.average_duration_ms().unwrap_or(0),
                history.latest().map(|r| r.duration_ms).unwrap_or(0)
            ),
            OutputFormat::Table => {
                let mut output = format!("\nHistory for {}\n", history.page());
                output.push_str("─────────────────────────────────────────────────────────\n");
                for record in history.records() {
                    output.push_str(&format!(
                        "  {}  {:20}  {:>8}ms  {}\n",
                        record.started_at.format("%Y-%m-%d %H:%M:%S"),
                        record.run_id,
                        record.duration_ms,
                        record.status
                    ));
                }
                output.push_str("─────────────────────────────────────────────────────────\n");
                output.push_str(&format!(
                    "  Average: {}ms\n",
                    history.average_duration_ms().unwrap_or(0)
                ));
                output
            }
        }
    }
}

fn display_root(context: &ExecutionContext) -> String {
    if context.root.is_root() {
        "(root)".to_string()
    } else {
        context.root.path().to_string()
    }
}

fn colorize_statuses(text: String) -> String {
    text.replace(
        &format!("  {} ", PageStatus::Pass.symbol()),
        &format!("  \x1b[32m{}\x1b[0m ", PageStatus::Pass.symbol()),
    )
    .replace(
        &format!("  {} ", PageStatus::Fail.symbol()),
        &format!("  \x1b[31m{}\x1b[0m ", PageStatus::Fail.symbol()),
    )
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}

fn csv_string(writer: csv::Writer<Vec<u8>>) -> String {
    writer
        .into_inner()
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}
