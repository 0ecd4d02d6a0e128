use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::record::DiseaseRecord;
use crate::core::types::{Confidence, DiseaseId, Severity, SymptomId};
use crate::utils::validation::count_to_f64;

/// Relative weights of coverage and recall in the composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for the fraction of the disease's symptom profile that was reported
    pub coverage: f64,
    /// Weight for the fraction of reported symptoms the disease explains
    pub recall: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            coverage: 0.5, // 50%
            recall: 0.5,   // 50%
        }
    }
}

impl ScoringWeights {
    /// Normalize weights to sum to 1.0
    #[must_use]
    pub fn normalized(&self) -> Self {
        if self.coverage < 0.0 || self.recall < 0.0 {
            return Self::default();
        }

        let total = self.coverage + self.recall;
        if total <= 0.0 || !total.is_finite() {
            return Self::default();
        }

        Self {
            coverage: self.coverage / total,
            recall: self.recall / total,
        }
    }
}

/// How well one disease explains a set of reported symptoms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub disease: DiseaseId,

    /// |R(D) ∩ Q|
    pub matched_count: usize,

    /// |R(D)|, the number of symptoms the disease record lists
    pub expected_count: usize,

    /// |Q|, the number of valid reported symptoms
    pub reported_count: usize,

    /// matched / expected: how much of the disease profile is present
    pub coverage: f64,

    /// matched / reported: how much of the complaint the disease explains
    pub recall: f64,

    pub severity: Severity,

    /// Tie-break weight derived from severity; not part of `composite`
    pub severity_weight: f64,

    /// Weighted harmonic mean of coverage and recall
    pub composite: f64,

    pub confidence: Confidence,

    /// Reported symptoms the disease lists
    pub matched: BTreeSet<SymptomId>,

    /// Symptoms the disease lists that were not reported
    pub missing: BTreeSet<SymptomId>,
}

impl MatchScore {
    /// Calculate match score between a disease and the reported symptoms
    #[must_use]
    pub fn calculate(disease: &DiseaseRecord, reported: &BTreeSet<SymptomId>) -> Self {
        Self::calculate_with_weights(disease, reported, &ScoringWeights::default())
    }

    /// Calculate match score with custom scoring weights
    #[must_use]
    pub fn calculate_with_weights(
        disease: &DiseaseRecord,
        reported: &BTreeSet<SymptomId>,
        weights: &ScoringWeights,
    ) -> Self {
        let (matched, missing): (BTreeSet<SymptomId>, BTreeSet<SymptomId>) = disease
            .related_symptoms
            .iter()
            .cloned()
            .partition(|s| reported.contains(s));

        let matched_count = matched.len();
        let expected_count = disease.related_symptoms.len();
        let reported_count = reported.len();

        let coverage = ratio(matched_count, expected_count);
        let recall = ratio(matched_count, reported_count);
        let composite = weighted_harmonic_mean(coverage, recall, weights);

        Self {
            disease: disease.id.clone(),
            matched_count,
            expected_count,
            reported_count,
            coverage,
            recall,
            severity: disease.severity,
            severity_weight: disease.severity.weight(),
            composite,
            confidence: Confidence::from_score(composite, coverage, recall),
            matched,
            missing,
        }
    }

    /// True when at least one reported symptom is listed by the disease
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        self.matched_count > 0
    }
}

/// `part / whole`, or 0.0 when `whole` is zero
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_to_f64(part) / count_to_f64(whole)
    }
}

/// Weighted harmonic mean of coverage and recall.
///
/// Returns 0.0 when either input is 0.0. A disease with very few listed
/// symptoms gets high coverage but is held back by recall, and a disease
/// attached to many common symptoms gets high recall but is held back by
/// coverage. With equal weights this is `2cr / (c + r)`.
#[must_use]
pub fn weighted_harmonic_mean(coverage: f64, recall: f64, weights: &ScoringWeights) -> f64 {
    if coverage <= 0.0 || recall <= 0.0 {
        return 0.0;
    }
    let w = weights.normalized();
    let denominator = w.coverage * recall + w.recall * coverage;
    if denominator <= 0.0 {
        return 0.0;
    }
    coverage * recall / denominator
}
