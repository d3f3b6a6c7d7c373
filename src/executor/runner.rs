//! Page command runner
//!
//! Executes one page by running a shell command built from a template.

use anyhow::{bail, Result};
use chrono::Utc;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::models::{PageOutcome, PagePath};
use crate::utils::timer::Timer;

/// Default per-page timeout
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(600);

/// Command line with `{root}` and `{page}` placeholders.
///
/// Substituted paths are shell-quoted unless they consist of plain
/// characters only, so placeholders belong unquoted in the template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    template: String,
}

impl CommandTemplate {
    pub const ROOT: &'static str = "{root}";
    pub const PAGE: &'static str = "{page}";

    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            bail!("Command template is empty");
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute the context root and page paths
    pub fn render(&self, root: &PagePath, page: &PagePath) -> String {
        self.template
            .replace(Self::ROOT, &shell_quote(&root.to_string()))
            .replace(Self::PAGE, &shell_quote(&page.to_string()))
    }
}

fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | ':' | '+' | '@')
        });
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}

/// Runs single pages through `sh -c`
#[derive(Clone, Debug)]
pub struct PageRunner {
    template: CommandTemplate,
    timeout: Duration,
}

impl PageRunner {
    pub fn new(template: CommandTemplate) -> Self {
        Self {
            template,
            timeout: DEFAULT_PAGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    /// Run `page` under `root`.
    ///
    /// A non-zero exit is a failure; a spawn error or timeout is an error.
    pub async fn run_page(&self, root: &PagePath, page: &PagePath) -> PageOutcome {
        let command_line = self.template.render(root, page);
        let started_at = Utc::now();
        let timer = Timer::start(format!("page {page}"));

        debug!("Running {page}: {command_line}");
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let outcome = match timeout(self.timeout, command.output()).await {
            Err(_) => PageOutcome::error(
                page.clone(),
                timer.elapsed_ms(),
                format!("timed out after {}s", self.timeout.as_secs_f64()),
            ),
            Ok(Err(e)) => {
                error!("Failed to start command for {page}: {e}");
                let message = format!("failed to start: {e}");
                PageOutcome::error(page.clone(), timer.elapsed_ms(), message)
            }
            Ok(Ok(output)) if output.status.success() => {
                PageOutcome::pass(page.clone(), timer.elapsed_ms())
            }
            Ok(Ok(output)) => {
                let mut message = match output.status.code() {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                };
                let stderr = String::from_utf8_lossy(&output.stderr);
                if let Some(line) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                    message.push_str(": ");
                    message.push_str(line.trim());
                }
                PageOutcome::fail(page.clone(), timer.elapsed_ms(), message)
            }
        };

        timer.stop();
        outcome.with_started_at(started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageStatus;

    #[test]
    fn test_render() {
        let template = CommandTemplate::new("fitnesse --root {root} --page {page}").unwrap();
        let rendered = template.render(&PagePath::parse("Suite"), &PagePath::parse("Suite.Test"));
        assert_eq!(rendered, "fitnesse --root Suite --page Suite.Test");
    }

    #[test]
    fn test_render_quotes_special_characters() {
        let template = CommandTemplate::new("run {root} {page}").unwrap();
        let rendered = template.render(&PagePath::root(), &PagePath::parse("Suite.It's; rm -rf x"));
        assert_eq!(rendered, r"run '' 'Suite.It'\''s; rm -rf x'");
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(CommandTemplate::new("   ").is_err());
    }

    #[tokio::test]
    async fn test_run_page_pass_and_fail() {
        let runner = PageRunner::new(CommandTemplate::new("test {page} = Suite.Good").unwrap());

        let pass = runner
            .run_page(&PagePath::parse("Suite"), &PagePath::parse("Suite.Good"))
            .await;
        assert_eq!(pass.status, PageStatus::Pass);

        let fail = runner
            .run_page(&PagePath::parse("Suite"), &PagePath::parse("Suite.Bad"))
            .await;
        assert_eq!(fail.status, PageStatus::Fail);
        assert!(fail.message.unwrap().starts_with("exit status 1"));
    }

    #[tokio::test]
    async fn test_page_name_cannot_change_command() {
        let runner =
            PageRunner::new(CommandTemplate::new("test {page} = 'Odd.Name; exit 7'").unwrap());
        let outcome = runner
            .run_page(&PagePath::parse("Odd"), &PagePath::parse("Odd.Name; exit 7"))
            .await;
        assert_eq!(outcome.status, PageStatus::Pass);
    }

    #[tokio::test]
    async fn test_failure_message_includes_stderr() {
        let template = CommandTemplate::new("echo 'no such page' >&2; exit 3").unwrap();
        let runner = PageRunner::new(template);
        let outcome = runner
            .run_page(&PagePath::root(), &PagePath::parse("Missing"))
            .await;
        assert_eq!(outcome.message.as_deref(), Some("exit status 3: no such page"));
    }

    #[tokio::test]
    async fn test_timeout_is_error() {
        let runner = PageRunner::new(CommandTemplate::new("sleep 5").unwrap())
            .with_timeout(Duration::from_millis(100));
        let outcome = runner
            .run_page(&PagePath::root(), &PagePath::parse("Slow"))
            .await;
        assert_eq!(outcome.status, PageStatus::Error);
        assert!(outcome.duration_ms < 5000);
    }
}
