//! Parallel context dispatch
//!
//! Each execution context runs on its own task; a semaphore bounds how many
//! run at once. Pages inside a context run one after another, between the
//! context's suite setup and suite teardown pages.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::PageRunner;
use crate::models::{ContextOutcome, ExecutionContext};
use crate::utils::timer::Timer;

/// Runs execution contexts concurrently
pub struct ContextDispatcher {
    runner: Arc<PageRunner>,
    max_concurrent: usize,
    run_fixtures: bool,
}

impl ContextDispatcher {
    pub fn new(runner: PageRunner, max_concurrent: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            max_concurrent: max_concurrent.max(1),
            run_fixtures: true,
        }
    }

    /// Whether suite setup and teardown pages run around each context
    pub fn run_fixtures(mut self, run: bool) -> Self {
        self.run_fixtures = run;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run every context, returning outcomes in context order
    pub async fn dispatch(&self, contexts: Vec<ExecutionContext>) -> Result<Vec<ContextOutcome>> {
        info!(
            "Dispatching {} contexts (max {} concurrent)",
            contexts.len(),
            self.max_concurrent
        );

        let timer = Timer::start("dispatch");
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(contexts.len());

        for (worker, context) in contexts.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let runner = self.runner.clone();
            let run_fixtures = self.run_fixtures;

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .context("Dispatcher semaphore closed")?;

                debug!("Context {} started: {}", worker + 1, context);
                let root = context.root.path();
                let setup = match context.fixtures.setup() {
                    Some(setup) if run_fixtures => Some(runner.run_page(root, setup).await),
                    _ => None,
                };
                if let Some(setup) = setup.as_ref().filter(|s| !s.status.is_success()) {
                    warn!("Suite setup {} failed in context {}", setup.page, worker + 1);
                }

                let mut pages = Vec::with_capacity(context.len());
                for page in &context.pages {
                    pages.push(runner.run_page(root, page.path()).await);
                }

                // teardown runs even when setup or pages failed
                let teardown = match context.fixtures.teardown() {
                    Some(teardown) if run_fixtures => Some(runner.run_page(root, teardown).await),
                    _ => None,
                };

                let outcome =
                    ContextOutcome::new(worker, &context, pages).with_fixtures(setup, teardown);
                debug!(
                    "Context {} finished: {}/{} passed",
                    worker + 1,
                    outcome.passed,
                    outcome.total
                );
                Ok::<_, anyhow::Error>(outcome)
            });

            handles.push(handle);
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            outcomes.push(joined.context("Context task panicked")??);
        }

        info!(
            "Dispatch completed in {}ms - {} contexts",
            timer.elapsed_ms(),
            outcomes.len()
        );
        Ok(outcomes)
    }
}
