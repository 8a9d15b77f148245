//! Evaluation report document and its file locations.

use super::comparison::{ComparisonRecord, SummaryReport};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Model whose output the comparison treats as the reference.
pub const BASELINE_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub model: String,
    pub baseline_model: String,
    pub provider: String,
    /// RFC 3339 UTC timestamp of report creation.
    pub timestamp: String,
    /// Milliseconds spent on the candidate enrichment.
    pub processing_time: u64,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metadata: ReportMetadata,
    pub summary: SummaryReport,
    pub comparison: Vec<ComparisonRecord>,
}

impl EvaluationReport {
    pub fn new(
        provider: &str,
        model: &str,
        elapsed: Duration,
        summary: SummaryReport,
        comparison: Vec<ComparisonRecord>,
    ) -> Self {
        let millis = elapsed.as_millis() as u64;
        Self {
            metadata: ReportMetadata {
                model: model.to_string(),
                baseline_model: BASELINE_MODEL.to_string(),
                provider: provider.to_string(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                processing_time: millis,
                processing_time_seconds: millis as f64 / 1000.0,
            },
            summary,
            comparison,
        }
    }

    /// Human readable summary lines for the console.
    pub fn console_summary(&self) -> Vec<String> {
        let model = &self.metadata.model;
        let baseline = &self.metadata.baseline_model;
        let s = &self.summary;
        vec![
            format!("Test Model: {}", model),
            format!("Baseline: {}", baseline),
            format!("Total records tested: {}", s.total_records),
            format!("Exact matches: {}", s.exact_matches),
            format!("Different extractions: {}", s.different),
            format!("{} found data {} missed: {}", model, baseline, s.candidate_better),
            format!("{} found data {} missed: {}", baseline, model, s.baseline_better),
            format!("{} failed to return result: {}", model, s.candidate_missing),
            format!("Processing time: {} seconds", self.metadata.processing_time_seconds),
        ]
    }
}

/// File-name safe form of a model name: every non-alphanumeric character
/// becomes `-`, then everything is lowercased.
pub fn model_slug(model: &str) -> String {
    model
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .to_lowercase()
}

/// Output locations of one comparison run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub enrichments: PathBuf,
    pub report: PathBuf,
}

impl ReportPaths {
    pub fn new(dir: &Path, provider: &str, model: &str) -> Self {
        let prefix = format!("{}-{}", provider, model_slug(model));
        Self {
            enrichments: dir.join(format!("{}-enrichments.json", prefix)),
            report: dir.join(format!("{}-report.json", prefix)),
        }
    }
}
