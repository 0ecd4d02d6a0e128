//! Thread-safe query facade over a shared knowledge base.
//!
//! A [`QuerySession`] owns the current knowledge base behind an
//! `RwLock<Arc<..>>`. Every query takes a snapshot (an `Arc` clone) and works
//! on it without holding the lock, so a [`reload`](QuerySession::reload) never
//! disturbs queries already in flight.

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::store::{CatalogError, KnowledgeBase};
use crate::catalog::validate::{validate, ValidationPolicy, ValidationReport};
use crate::core::record::{DiseaseRecord, SymptomRecord};
use crate::matching::engine::{
    MatchingConfig, MatchingEngine, QueryError, QueryNotice, ScoreSet, SingleScore,
};
use crate::matching::explain::Explanation;
use crate::matching::ranking::Ranking;
use crate::matching::scoring::MatchScore;

/// Shown with every human-facing result
pub const DISCLAIMER: &str =
    "Results rank catalog entries by symptom overlap. They are not a diagnosis; consult a qualified clinician.";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Knowledge base failed strict validation with {} findings", .0.len())]
    Inconsistent(ValidationReport),
}

/// A knowledge base together with its validation report
#[derive(Debug, Clone)]
struct Loaded {
    kb: Arc<KnowledgeBase>,
    report: Arc<ValidationReport>,
}

/// Long-lived entry point for lookups and queries
#[derive(Debug)]
pub struct QuerySession {
    current: RwLock<Loaded>,
    config: MatchingConfig,
    policy: ValidationPolicy,
}

impl QuerySession {
    /// Validate `kb` under `policy` and start serving it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Inconsistent` if `policy` is strict and the
    /// validator reports any finding.
    pub fn open(
        kb: KnowledgeBase,
        config: MatchingConfig,
        policy: ValidationPolicy,
    ) -> Result<Self, SessionError> {
        let loaded = check(kb, policy)?;
        Ok(Self {
            current: RwLock::new(loaded),
            config,
            policy,
        })
    }

    /// Open a session over the catalog compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Catalog` if the embedded sections fail to load,
    /// or `SessionError::Inconsistent` under a strict policy.
    pub fn open_embedded(
        config: MatchingConfig,
        policy: ValidationPolicy,
    ) -> Result<Self, SessionError> {
        Self::open(KnowledgeBase::load_embedded()?, config, policy)
    }

    /// Validate a freshly built knowledge base and swap it in.
    ///
    /// On error the current knowledge base stays in place.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Inconsistent` if the session policy is strict and
    /// the new knowledge base has findings.
    pub fn reload(&self, kb: KnowledgeBase) -> Result<(), SessionError> {
        let loaded = check(kb, self.policy)?;
        let (diseases, symptoms) = (loaded.kb.disease_count(), loaded.kb.symptom_count());

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = loaded;

        info!("Reloaded knowledge base: {diseases} diseases, {symptoms} symptoms");
        Ok(())
    }

    fn loaded(&self) -> Loaded {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The knowledge base currently being served
    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        self.loaded().kb
    }

    /// Validation report of the knowledge base currently being served
    pub fn report(&self) -> Arc<ValidationReport> {
        self.loaded().report
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn lookup_disease(&self, id: &str) -> Option<DiseaseRecord> {
        self.snapshot().disease(id).cloned()
    }

    pub fn lookup_symptom(&self, id: &str) -> Option<SymptomRecord> {
        self.snapshot().symptom(id).cloned()
    }

    /// Score and rank every disease against the reported symptoms.
    ///
    /// # Errors
    ///
    /// See [`MatchingEngine::score`].
    pub fn query<I, S>(&self, reported: I, limit: Option<usize>) -> Result<QueryOutcome, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kb = self.snapshot();
        let scores = MatchingEngine::with_config(&kb, self.config.clone()).score(reported)?;
        Ok(QueryOutcome { kb, scores, limit })
    }

    /// Score one disease, with its rationale.
    ///
    /// # Errors
    ///
    /// See [`MatchingEngine::score_one`].
    pub fn explain<I, S>(&self, disease_id: &str, reported: I) -> Result<ExplainOutcome, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kb = self.snapshot();
        let engine = MatchingEngine::with_config(&kb, self.config.clone());
        let SingleScore {
            disease,
            score,
            notices,
        } = engine.score_one(disease_id, reported)?;
        let explanation = Explanation::build(&score, disease, &kb);

        Ok(ExplainOutcome {
            score,
            explanation,
            notices,
        })
    }
}

/// Validate `kb` and apply `policy`
fn check(kb: KnowledgeBase, policy: ValidationPolicy) -> Result<Loaded, SessionError> {
    let report = validate(&kb);

    if !report.is_clean() {
        match policy {
            ValidationPolicy::Strict => return Err(SessionError::Inconsistent(report)),
            ValidationPolicy::Warn => {
                warn!(
                    "Knowledge base has {} consistency findings ({} asymmetric, {} dangling)",
                    report.len(),
                    report.asymmetric().count(),
                    report.dangling().count()
                );
                for finding in &report.findings {
                    debug!("{finding}");
                }
            }
        }
    }

    Ok(Loaded {
        kb: Arc::new(kb),
        report: Arc::new(report),
    })
}

/// Result of [`QuerySession::query`]
///
/// Keeps the knowledge base snapshot it was computed against.
#[derive(Debug)]
pub struct QueryOutcome {
    kb: Arc<KnowledgeBase>,
    scores: ScoreSet,
    limit: Option<usize>,
}

impl QueryOutcome {
    /// Ranked candidates, best first
    pub fn candidates(&self) -> Ranking<'_> {
        self.scores.rank(self.limit)
    }

    pub fn notices(&self) -> &[QueryNotice] {
        &self.scores.notices
    }

    pub fn scores(&self) -> &ScoreSet {
        &self.scores
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }
}

/// Result of [`QuerySession::explain`]
#[derive(Debug, Clone, Serialize)]
pub struct ExplainOutcome {
    pub score: MatchScore,
    pub explanation: Explanation,
    pub notices: Vec<QueryNotice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RawDiseaseRecord, RawSymptomRecord};

    fn consistent_kb(disease: &str) -> KnowledgeBase {
        KnowledgeBase::load(
            vec![RawDiseaseRecord::new(disease, "moderate", "Test").with_symptoms(&["Fever"])],
            vec![RawSymptomRecord::new("Fever", "low", "General").with_diseases(&[disease])],
        )
        .unwrap()
    }

    #[test]
    fn test_session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QuerySession>();
    }

    #[test]
    fn test_strict_policy_rejects_inconsistent_catalog() {
        let result = QuerySession::open_embedded(MatchingConfig::default(), ValidationPolicy::Strict);
        assert!(matches!(result, Err(SessionError::Inconsistent(_))));
    }

    #[test]
    fn test_warn_policy_keeps_report() {
        let session =
            QuerySession::open_embedded(MatchingConfig::default(), ValidationPolicy::Warn).unwrap();
        assert!(!session.report().is_clean());
        assert!(session.lookup_disease("Pneumonia").is_some());
        assert!(session.lookup_symptom("Fever").is_some());
        assert!(session.lookup_disease("fever").is_none());
    }

    #[test]
    fn test_query_outcome() {
        let session =
            QuerySession::open(consistent_kb("Flu"), MatchingConfig::default(), ValidationPolicy::Strict)
                .unwrap();
        let outcome = session.query(["Fever", "Glitter"], None).unwrap();

        assert_eq!(outcome.candidates().len(), 1);
        assert_eq!(outcome.notices().len(), 1);
        assert_eq!(outcome.candidates().best().unwrap().disease.as_str(), "Flu");
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let session =
            QuerySession::open(consistent_kb("Flu"), MatchingConfig::default(), ValidationPolicy::Strict)
                .unwrap();
        let before = session.query(["Fever"], None).unwrap();

        session.reload(consistent_kb("Measles")).unwrap();
        let after = session.query(["Fever"], None).unwrap();

        // The earlier outcome still reads from its own snapshot
        assert!(before.knowledge_base().disease("Flu").is_some());
        assert_eq!(before.candidates().best().unwrap().disease.as_str(), "Flu");
        assert_eq!(after.candidates().best().unwrap().disease.as_str(), "Measles");
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let session =
            QuerySession::open(consistent_kb("Flu"), MatchingConfig::default(), ValidationPolicy::Strict)
                .unwrap();
        let inconsistent = KnowledgeBase::load(
            vec![RawDiseaseRecord::new("Gout", "moderate", "Joint").with_symptoms(&["Joint Pain"])],
            Vec::new(),
        )
        .unwrap();

        assert!(session.reload(inconsistent).is_err());
        assert!(session.lookup_disease("Flu").is_some());
        assert!(session.lookup_disease("Gout").is_none());
    }

    #[test]
    fn test_explain_unknown_disease() {
        let session =
            QuerySession::open(consistent_kb("Flu"), MatchingConfig::default(), ValidationPolicy::Strict)
                .unwrap();
        assert!(matches!(
            session.explain("Nope", ["Fever"]),
            Err(QueryError::UnknownDisease(_))
        ));
    }

    #[test]
    fn test_concurrent_queries_during_reload() {
        let session =
            QuerySession::open(consistent_kb("Flu"), MatchingConfig::default(), ValidationPolicy::Strict)
                .unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let outcome = session.query(["Fever"], Some(1)).unwrap();
                        let best = outcome.candidates().best().unwrap();
                        assert!(matches!(best.disease.as_str(), "Flu" | "Measles"));
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..20 {
                    let name = if i % 2 == 0 { "Measles" } else { "Flu" };
                    session.reload(consistent_kb(name)).unwrap();
                }
            });
        });
    }
}
