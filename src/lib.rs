//! Vinyl Color Enricher Library
//!
//! Turns free-form vinyl format descriptions from a Discogs collection into
//! structured color, pattern and texture records using LLM completions.

pub mod collection;
pub mod config;
pub mod enrichment;
pub mod evaluation;
pub mod llm;
pub mod persistence;

// Re-export commonly used types for convenience
pub use collection::{extract_descriptions, CollectionRecord, DescriptionMap, DiscogsClient};
pub use config::{AppConfig, CliConfig, FileConfig, ProviderKind};
pub use enrichment::{
    build_batches, normalize, AggregateRequestError, Batch, EnrichmentPipeline, EnrichmentRecord,
    EnrichmentRequester,
};
pub use llm::{LlmError, LlmProvider};
