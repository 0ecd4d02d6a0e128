use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{Confidence, DiseaseId, Severity, SymptomId};
use crate::matching::scoring::MatchScore;

/// One entry of a ranked result list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// 1-based position in the ranking
    pub rank: usize,
    pub disease: DiseaseId,
    pub composite: f64,
    pub coverage: f64,
    pub recall: f64,
    pub matched: BTreeSet<SymptomId>,
    /// Symptoms the disease lists that were not reported
    pub missing: BTreeSet<SymptomId>,
    pub severity: Severity,
    pub confidence: Confidence,
}

impl RankedCandidate {
    fn from_score(rank: usize, score: &MatchScore) -> Self {
        Self {
            rank,
            disease: score.disease.clone(),
            composite: score.composite,
            coverage: score.coverage,
            recall: score.recall,
            matched: score.matched.clone(),
            missing: score.missing.clone(),
            severity: score.severity,
            confidence: score.confidence,
        }
    }
}

/// Composites are compared at this resolution, so scores that are equal
/// in exact arithmetic tie even when their `f64` values differ in the last bit.
const COMPOSITE_RESOLUTION: f64 = 1e9;

/// Integer ranking key for a composite score in `[0, 1]`
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn composite_key(composite: f64) -> i64 {
    (composite * COMPOSITE_RESOLUTION).round() as i64
}

/// Ranking order: composite descending, then severity weight descending,
/// then disease id ascending.
#[must_use]
pub fn compare_scores(a: &MatchScore, b: &MatchScore) -> Ordering {
    composite_key(b.composite)
        .cmp(&composite_key(a.composite))
        .then_with(|| b.severity_weight.total_cmp(&a.severity_weight))
        .then_with(|| a.disease.cmp(&b.disease))
}

/// Ordered view over a score map.
///
/// Holds references in rank order only; candidates are built as the
/// iterator advances, and [`Ranking::iter`] can be called any number of times.
#[derive(Debug, Clone)]
pub struct Ranking<'s> {
    order: Vec<&'s MatchScore>,
}

/// Rank `scores`, keeping at most `limit` entries.
///
/// `None` and `Some(0)` both keep everything.
#[must_use]
pub fn rank(scores: &BTreeMap<DiseaseId, MatchScore>, limit: Option<usize>) -> Ranking<'_> {
    let mut order: Vec<&MatchScore> = scores.values().collect();
    order.sort_by(|a, b| compare_scores(a, b));

    if let Some(n) = limit.filter(|&n| n > 0) {
        order.truncate(n);
    }

    Ranking { order }
}

impl<'s> Ranking<'s> {
    pub fn iter(&self) -> RankingIter<'_, 's> {
        RankingIter {
            inner: self.order.iter().enumerate(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The top candidate, if any
    pub fn best(&self) -> Option<RankedCandidate> {
        self.iter().next()
    }

    /// Scores in rank order, without building candidates
    pub fn scores(&self) -> impl Iterator<Item = &'s MatchScore> + '_ {
        self.order.iter().copied()
    }
}

impl<'r, 's> IntoIterator for &'r Ranking<'s> {
    type Item = RankedCandidate;
    type IntoIter = RankingIter<'r, 's>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`Ranking`]
pub struct RankingIter<'r, 's> {
    inner: std::iter::Enumerate<std::slice::Iter<'r, &'s MatchScore>>,
}

impl Iterator for RankingIter<'_, '_> {
    type Item = RankedCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(i, score)| RankedCandidate::from_score(i + 1, score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RankingIter<'_, '_> {}
