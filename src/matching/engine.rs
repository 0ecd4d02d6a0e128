use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

use crate::catalog::index::CandidateFinder;
use crate::catalog::store::KnowledgeBase;
use crate::core::record::DiseaseRecord;
use crate::core::types::{DiseaseId, SymptomId};
use crate::matching::ranking::{rank, Ranking};
use crate::matching::scoring::{MatchScore, ScoringWeights};
use crate::utils::validation::check_query_limit;

/// Errors that prevent a query from producing results
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Nothing usable was reported. `unknown` lists the identifiers that were
    /// dropped for not being in the symptom catalog.
    #[error("No known symptoms in query{}", unknown_suffix(.unknown))]
    EmptyQuery { unknown: Vec<SymptomId> },

    #[error("Unknown disease '{0}'")]
    UnknownDisease(String),

    #[error("{0}")]
    TooManySymptoms(String),
}

fn unknown_suffix(unknown: &[SymptomId]) -> String {
    if unknown.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = unknown.iter().map(SymptomId::as_str).collect();
        format!(" (unrecognized: {})", names.join(", "))
    }
}

/// Non-fatal anomalies returned alongside query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum QueryNotice {
    /// The identifier is not in the symptom catalog and was not scored
    UnknownSymptom(SymptomId),
}

impl std::fmt::Display for QueryNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSymptom(id) => write!(f, "Unknown symptom '{id}' was ignored"),
        }
    }
}

/// Default minimum score threshold for matches
pub const DEFAULT_MIN_SCORE: f64 = 0.0;

/// Configuration for the matching engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Candidates scoring at or below this are dropped
    pub min_score: f64,
    /// Custom scoring weights
    pub scoring_weights: ScoringWeights,
    /// Restrict candidates to diseases from these sections
    pub sections: Option<BTreeSet<String>>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            scoring_weights: ScoringWeights::default(),
            sections: None,
        }
    }
}

impl MatchingConfig {
    fn admits_section(&self, section: Option<&str>) -> bool {
        match &self.sections {
            None => true,
            Some(allowed) => section.is_some_and(|s| allowed.contains(s)),
        }
    }
}

/// One disease scored on request, together with its catalog record
#[derive(Debug, Clone)]
pub struct SingleScore<'a> {
    pub disease: &'a DiseaseRecord,
    pub score: MatchScore,
    pub notices: Vec<QueryNotice>,
}

/// Every disease with evidence for one query, keyed by disease id
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSet {
    /// The valid, de-duplicated symptoms that were scored
    pub reported: BTreeSet<SymptomId>,

    pub scores: BTreeMap<DiseaseId, MatchScore>,

    pub notices: Vec<QueryNotice>,
}

impl ScoreSet {
    /// Order the scores; `None` or `Some(0)` keeps every candidate
    #[must_use]
    pub fn rank(&self, limit: Option<usize>) -> Ranking<'_> {
        rank(&self.scores, limit)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// A reported symptom list split into the scorable part and notices
#[derive(Debug)]
struct PreparedQuery {
    reported: BTreeSet<SymptomId>,
    notices: Vec<QueryNotice>,
}

/// The main matching engine
pub struct MatchingEngine<'a> {
    kb: &'a KnowledgeBase,
    /// Configuration including scoring weights and thresholds
    config: MatchingConfig,
}

impl<'a> MatchingEngine<'a> {
    /// Create a new matching engine with default configuration
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self {
            kb,
            config: MatchingConfig::default(),
        }
    }

    /// Create a new matching engine with custom configuration
    pub fn with_config(kb: &'a KnowledgeBase, config: MatchingConfig) -> Self {
        Self { kb, config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Score every disease that lists at least one reported symptom.
    ///
    /// Repeated identifiers count once. Identifiers missing from the symptom
    /// catalog are returned as notices and take no part in scoring.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::TooManySymptoms` if the query exceeds the size
    /// limit, or `QueryError::EmptyQuery` if no known symptom remains.
    pub fn score<I, S>(&self, reported: I) -> Result<ScoreSet, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let PreparedQuery { reported, notices } = self.prepare(reported)?;

        let finder = CandidateFinder::new(self.kb);
        let candidates = finder.find_candidates(&reported);
        let candidate_count = candidates.len();

        let scores: BTreeMap<DiseaseId, MatchScore> = candidates
            .into_iter()
            .filter(|(disease, _)| self.config.admits_section(disease.section.as_deref()))
            .map(|(disease, _)| {
                MatchScore::calculate_with_weights(disease, &reported, &self.config.scoring_weights)
            })
            .filter(|score| score.has_evidence() && score.composite > self.config.min_score)
            .map(|score| (score.disease.clone(), score))
            .collect();

        debug!(
            "Scored {} symptoms: {} candidates, {} kept, {} unknown",
            reported.len(),
            candidate_count,
            scores.len(),
            notices.len()
        );

        Ok(ScoreSet {
            reported,
            scores,
            notices,
        })
    }

    /// Score a single disease against the reported symptoms.
    ///
    /// Unlike [`score`](Self::score), the disease is scored even without any
    /// overlap, and the section filter and minimum score do not apply.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnknownDisease` if the disease is not in the
    /// catalog, otherwise the same errors as [`score`](Self::score).
    pub fn score_one<I, S>(
        &self,
        disease_id: &str,
        reported: I,
    ) -> Result<SingleScore<'a>, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let disease = self
            .kb
            .disease(disease_id)
            .ok_or_else(|| QueryError::UnknownDisease(disease_id.to_string()))?;

        let PreparedQuery { reported, notices } = self.prepare(reported)?;
        let score =
            MatchScore::calculate_with_weights(disease, &reported, &self.config.scoring_weights);
        Ok(SingleScore {
            disease,
            score,
            notices,
        })
    }

    fn prepare<I, S>(&self, reported: I) -> Result<PreparedQuery, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = reported
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        if let Some(message) = check_query_limit(distinct.len()) {
            return Err(QueryError::TooManySymptoms(message));
        }

        let (known, unknown): (Vec<String>, Vec<String>) = distinct
            .into_iter()
            .partition(|id| self.kb.contains_symptom(id));

        let reported: BTreeSet<SymptomId> = known.into_iter().map(SymptomId).collect();
        let unknown: Vec<SymptomId> = unknown.into_iter().map(SymptomId).collect();

        if reported.is_empty() {
            return Err(QueryError::EmptyQuery { unknown });
        }

        let notices = unknown.into_iter().map(QueryNotice::UnknownSymptom).collect();
        Ok(PreparedQuery { reported, notices })
    }
}
