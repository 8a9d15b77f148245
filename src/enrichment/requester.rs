//! Concurrent dispatch of batch requests to an LLM provider.
//!
//! Every batch is submitted and every request is awaited to completion before
//! anything is reported; one slow or failing batch never cancels the others.

use super::adapter::ResponseAdapter;
use super::batch::Batch;
use crate::llm::{CompletionOptions, CompletionResponse, LlmError, LlmProvider};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Settled result of one asynchronous operation.
#[derive(Debug)]
pub enum Outcome<T, E> {
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> Outcome<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Fulfilled(value) => Ok(value),
            Outcome::Rejected(error) => Err(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfilled(value),
            Err(error) => Outcome::Rejected(error),
        }
    }
}

/// One batch and how its request settled.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch: Batch,
    pub outcome: Outcome<CompletionResponse, LlmError>,
}

/// A rejected batch request, with enough context to retry it.
#[derive(Debug)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub record_ids: Vec<String>,
    pub error: LlmError,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch {} ({} records): {}",
            self.batch_index,
            self.record_ids.len(),
            self.error
        )
    }
}

/// Raised when at least one batch request was rejected.
///
/// Carries every failure, not only the first.
#[derive(Debug, Error)]
#[error("{} of {total} enrichment requests failed", failures.len())]
pub struct AggregateRequestError {
    pub total: usize,
    pub failures: Vec<BatchFailure>,
}

impl AggregateRequestError {
    /// Ids of every record whose batch failed, in batch order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .flat_map(|f| f.record_ids.iter().map(String::as_str))
            .collect()
    }
}

/// Split settled outcomes into successful responses and failures.
pub fn partition(outcomes: Vec<BatchOutcome>) -> (Vec<(Batch, CompletionResponse)>, Vec<BatchFailure>) {
    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for BatchOutcome { batch, outcome } in outcomes {
        match outcome {
            Outcome::Fulfilled(response) => successes.push((batch, response)),
            Outcome::Rejected(error) => failures.push(BatchFailure {
                batch_index: batch.index,
                record_ids: batch.ids(),
                error,
            }),
        }
    }

    (successes, failures)
}

/// Succeed only when every batch request was fulfilled.
pub fn settle(
    outcomes: Vec<BatchOutcome>,
) -> Result<Vec<(Batch, CompletionResponse)>, AggregateRequestError> {
    let total = outcomes.len();
    let (successes, failures) = partition(outcomes);
    if failures.is_empty() {
        Ok(successes)
    } else {
        Err(AggregateRequestError { total, failures })
    }
}

/// Sends batches to one provider and collects every outcome.
pub struct EnrichmentRequester {
    provider: Arc<dyn LlmProvider>,
    adapter: Arc<dyn ResponseAdapter>,
    options: CompletionOptions,
    max_concurrency: Option<NonZeroUsize>,
    show_progress: bool,
}

impl EnrichmentRequester {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        adapter: Arc<dyn ResponseAdapter>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            provider,
            adapter,
            options,
            max_concurrency: None,
            show_progress: false,
        }
    }

    /// Cap the number of requests in flight. Unset means all at once.
    pub fn with_max_concurrency(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn adapter(&self) -> &Arc<dyn ResponseAdapter> {
        &self.adapter
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
            return pb;
        }
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        pb
    }

    async fn request_one(
        &self,
        batch: Batch,
        instructions: &str,
        pb: &ProgressBar,
    ) -> BatchOutcome {
        let messages = self.adapter.build_messages(instructions, &batch);
        let start = Instant::now();
        debug!(batch = batch.index, records = batch.len(), "Sending batch");

        let result = self.provider.complete(&messages, &self.options).await;
        match &result {
            Ok(response) => debug!(
                batch = batch.index,
                choices = response.choices.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Batch completed"
            ),
            Err(e) => warn!(batch = batch.index, error = %e, "Batch request failed"),
        }
        pb.inc(1);

        BatchOutcome {
            batch,
            outcome: result.into(),
        }
    }

    /// Issue one request per batch and wait for all of them to settle.
    ///
    /// Outcomes are returned in batch order, one per input batch.
    pub async fn request_enrichments(
        &self,
        batches: Vec<Batch>,
        instructions: &str,
    ) -> Vec<BatchOutcome> {
        let total = batches.len();
        info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            batches = total,
            max_concurrency = self.max_concurrency.map(NonZeroUsize::get),
            "Requesting enrichments"
        );

        let pb = self.progress_bar(total);
        let requests = batches
            .into_iter()
            .map(|batch| self.request_one(batch, instructions, &pb));

        let outcomes: Vec<BatchOutcome> = match self.max_concurrency {
            Some(limit) => {
                stream::iter(requests)
                    .buffered(limit.get())
                    .collect::<Vec<_>>()
                    .await
            }
            None => futures::future::join_all(requests).await,
        };
        pb.finish_and_clear();

        let failed = outcomes.iter().filter(|o| !o.outcome.is_fulfilled()).count();
        info!(total, failed, "All enrichment requests settled");
        outcomes
    }
}
