//! Model comparison harness.
//!
//! Samples a baseline enrichment run, re-runs the sample through another model
//! and classifies every pair. Read-only with respect to the main pipeline.

mod comparison;
mod report;

pub use comparison::{
    build_comparison, categorize, compare, sample, sample_ids, summarize, ComparisonRecord,
    EnrichmentFields, SummaryReport, Verdict, MAX_EXAMPLE_DIFFERENCES, SAMPLE_ENRICHED,
    SAMPLE_NOT_ENRICHED,
};
pub use report::{model_slug, EvaluationReport, ReportMetadata, ReportPaths, BASELINE_MODEL};
