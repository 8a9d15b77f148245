//! End-to-end enrichment of a description map.

use super::adapter::ResponseAdapter;
use super::batch::{batch_count, build_batches};
use super::models::EnrichmentRecord;
use super::normalizer::normalize;
use super::requester::{partition, settle, AggregateRequestError, BatchFailure, EnrichmentRequester};
use crate::collection::DescriptionMap;
use std::num::NonZeroUsize;
use tracing::{info, warn};

/// Batches descriptions, requests them and normalizes the answers.
pub struct EnrichmentPipeline {
    requester: EnrichmentRequester,
    batch_size: NonZeroUsize,
    instructions: String,
}

impl EnrichmentPipeline {
    /// Build a pipeline using the instruction preamble of the requester's adapter.
    pub fn new(requester: EnrichmentRequester, batch_size: NonZeroUsize) -> Self {
        let instructions = requester.adapter().instructions();
        Self {
            requester,
            batch_size,
            instructions,
        }
    }

    fn adapter(&self) -> &dyn ResponseAdapter {
        self.requester.adapter().as_ref()
    }

    /// Enrich every description, failing if any batch request failed.
    ///
    /// Nothing is returned unless every request was fulfilled, so a partial
    /// result can never be mistaken for a complete one.
    pub async fn enrich(
        &self,
        descriptions: &DescriptionMap,
    ) -> Result<Vec<EnrichmentRecord>, AggregateRequestError> {
        let batches = build_batches(descriptions, self.batch_size);
        info!(
            records = descriptions.len(),
            batches = batch_count(descriptions.len(), self.batch_size),
            batch_size = self.batch_size.get(),
            "Starting enrichment"
        );

        let outcomes = self
            .requester
            .request_enrichments(batches, &self.instructions)
            .await;
        let responses = settle(outcomes)?;

        let records = normalize(self.adapter(), &responses);
        info!(
            requested = descriptions.len(),
            enriched = records.len(),
            "Enrichment finished"
        );
        Ok(records)
    }

    /// Enrich what can be enriched, returning failed batches alongside.
    pub async fn enrich_partial(
        &self,
        descriptions: &DescriptionMap,
    ) -> (Vec<EnrichmentRecord>, Vec<BatchFailure>) {
        let batches = build_batches(descriptions, self.batch_size);
        let outcomes = self
            .requester
            .request_enrichments(batches, &self.instructions)
            .await;
        let (responses, failures) = partition(outcomes);

        for failure in &failures {
            warn!(%failure, "Skipping failed batch");
        }

        (normalize(self.adapter(), &responses), failures)
    }
}
