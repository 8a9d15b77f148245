//! Sampling and pairwise comparison of two enrichment runs.

use crate::enrichment::EnrichmentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Enriched baseline records included in a sample.
pub const SAMPLE_ENRICHED: usize = 10;
/// Baseline records without data included in a sample.
pub const SAMPLE_NOT_ENRICHED: usize = 5;
/// Differing records kept in a summary for review.
pub const MAX_EXAMPLE_DIFFERENCES: usize = 10;

/// The four model-produced fields of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentFields {
    pub human_readable_color: Option<String>,
    pub css_readable_colors: Option<Vec<String>>,
    pub pattern: Option<String>,
    pub texture: Option<String>,
}

impl EnrichmentFields {
    pub fn has_data(&self) -> bool {
        self.css_readable_colors
            .as_ref()
            .is_some_and(|c| !c.is_empty())
            || self.pattern.is_some()
            || self.texture.is_some()
    }
}

impl From<&EnrichmentRecord> for EnrichmentFields {
    fn from(record: &EnrichmentRecord) -> Self {
        Self {
            human_readable_color: record.human_readable_color.clone(),
            css_readable_colors: record.css_readable_colors.clone(),
            pattern: record.pattern.clone(),
            texture: record.texture.clone(),
        }
    }
}

/// A baseline record next to the candidate's answer for the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub id: String,
    pub description: String,
    pub baseline: EnrichmentFields,
    /// `None` when the candidate returned nothing for this id.
    pub candidate: Option<EnrichmentFields>,
}

/// How a candidate answer relates to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    ExactMatch,
    CandidateFoundMore,
    BaselineFoundMore,
    Different,
    CandidateMissing,
}

impl ComparisonRecord {
    pub fn verdict(&self) -> Verdict {
        let Some(candidate) = &self.candidate else {
            return Verdict::CandidateMissing;
        };
        if *candidate == self.baseline {
            return Verdict::ExactMatch;
        }
        match (self.baseline.has_data(), candidate.has_data()) {
            (false, true) => Verdict::CandidateFoundMore,
            (true, false) => Verdict::BaselineFoundMore,
            // Neither side has machine data but the human readable colors differ.
            _ => Verdict::Different,
        }
    }
}

/// Aggregate counts of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_records: usize,
    pub exact_matches: usize,
    pub different: usize,
    pub candidate_better: usize,
    pub baseline_better: usize,
    pub candidate_missing: usize,
    pub example_differences: Vec<ComparisonRecord>,
}

/// Split records into those with machine data and those without.
pub fn categorize(records: &[EnrichmentRecord]) -> (Vec<&EnrichmentRecord>, Vec<&EnrichmentRecord>) {
    records.iter().partition(|r| r.has_enrichment())
}

/// The first enriched records followed by the first records without data.
pub fn sample(baseline: &[EnrichmentRecord]) -> Vec<EnrichmentRecord> {
    let (enriched, not_enriched) = categorize(baseline);
    enriched
        .into_iter()
        .take(SAMPLE_ENRICHED)
        .chain(not_enriched.into_iter().take(SAMPLE_NOT_ENRICHED))
        .cloned()
        .collect()
}

/// Ids of a sample, for re-deriving its descriptions.
pub fn sample_ids(sample: &[EnrichmentRecord]) -> HashSet<String> {
    sample.iter().map(|r| r.id.clone()).collect()
}

/// Pair each sampled baseline record with the candidate record of the same id.
pub fn build_comparison(
    sample: &[EnrichmentRecord],
    candidate: &[EnrichmentRecord],
) -> Vec<ComparisonRecord> {
    sample
        .iter()
        .map(|base| ComparisonRecord {
            id: base.id.clone(),
            description: base.description.clone(),
            baseline: base.into(),
            candidate: candidate.iter().find(|c| c.id == base.id).map(Into::into),
        })
        .collect()
}

pub fn summarize(comparison: &[ComparisonRecord]) -> SummaryReport {
    let mut summary = SummaryReport {
        total_records: comparison.len(),
        ..Default::default()
    };

    for record in comparison {
        let verdict = record.verdict();
        match verdict {
            Verdict::ExactMatch => summary.exact_matches += 1,
            Verdict::CandidateMissing => summary.candidate_missing += 1,
            Verdict::CandidateFoundMore => summary.candidate_better += 1,
            Verdict::BaselineFoundMore => summary.baseline_better += 1,
            Verdict::Different => summary.different += 1,
        }

        let differs = !matches!(verdict, Verdict::ExactMatch | Verdict::CandidateMissing);
        if differs && summary.example_differences.len() < MAX_EXAMPLE_DIFFERENCES {
            summary.example_differences.push(record.clone());
        }
    }

    summary
}

/// Sample the baseline, pair it with the candidate and summarize.
pub fn compare(
    baseline: &[EnrichmentRecord],
    candidate: &[EnrichmentRecord],
) -> (Vec<ComparisonRecord>, SummaryReport) {
    let comparison = build_comparison(&sample(baseline), candidate);
    let summary = summarize(&comparison);
    (comparison, summary)
}
