//! Symptom matching, scoring and ranking.
//!
//! This module provides the core inference functionality:
//!
//! - [`MatchingEngine`]: scores every disease against a set of reported symptoms
//! - [`MatchScore`]: coverage, recall and composite for one disease
//! - [`Ranking`]: ordered, lazily materialized view over a score map
//! - [`Explanation`]: rationale for a single disease's score
//!
//! ## Scoring
//!
//! For a disease D listing symptoms R(D) and a valid reported set Q, with
//! `m = |R(D) ∩ Q|`:
//!
//! - **Coverage** `m / |R(D)|`: how much of the disease profile was reported
//! - **Recall** `m / |Q|`: how much of the complaint the disease explains
//! - **Composite**: weighted harmonic mean of the two; with equal weights this
//!   is `2m / (|R(D)| + |Q|)`
//!
//! Severity never changes the composite. It only breaks ties, ahead of the
//! disease identifier.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dx_solver::catalog::store::KnowledgeBase;
//! use dx_solver::matching::{MatchingConfig, MatchingEngine};
//!
//! let kb = KnowledgeBase::load_embedded().unwrap();
//! let engine = MatchingEngine::with_config(&kb, MatchingConfig::default());
//! let scores = engine.score(["Fever", "Cough", "Shortness of Breath"]).unwrap();
//!
//! for candidate in scores.rank(Some(5)).iter() {
//!     println!("{}. {} ({:.1}%)",
//!         candidate.rank,
//!         candidate.disease,
//!         candidate.composite * 100.0
//!     );
//! }
//! ```

pub mod engine;
pub mod explain;
pub mod ranking;
pub mod scoring;

pub use engine::{MatchingConfig, MatchingEngine, QueryError, QueryNotice, ScoreSet, SingleScore};
pub use explain::Explanation;
pub use ranking::{rank, RankedCandidate, Ranking};
pub use scoring::{MatchScore, ScoringWeights};
