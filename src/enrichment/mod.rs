//! Batching and enrichment pipeline.
//!
//! Descriptions are split into fixed-size batches, each batch is sent to the
//! configured LLM provider concurrently, and every answer is validated into
//! the canonical [`EnrichmentRecord`] schema. A run either succeeds for every
//! batch or reports every failed batch; individual malformed records are
//! logged and dropped without failing the run.

mod adapter;
mod batch;
mod instructions;
mod models;
mod normalizer;
mod pipeline;
mod requester;

pub use adapter::{ParseError, PerChoiceAdapter, RecordsEnvelopeAdapter, ResponseAdapter, ResponseShape};
pub use batch::{batch_count, build_batches, Batch, BatchEntry};
pub use instructions::{single_record_instructions, system_instructions, SYSTEM_INSTRUCTIONS};
pub use models::{EnrichmentRecord, RawEnrichment};
pub use normalizer::{is_css_color, normalize, normalize_record};
pub use pipeline::EnrichmentPipeline;
pub use requester::{
    partition, settle, AggregateRequestError, BatchFailure, BatchOutcome, EnrichmentRequester,
    Outcome,
};
