//! # dx-solver
//!
//! A library for ranking candidate diseases from a set of reported symptoms.
//!
//! The knowledge base pairs a disease catalog with a symptom catalog. Each record
//! lists related records from the other catalog, and those lists are maintained
//! independently, so they are not always mirror images of each other.
//!
//! `dx-solver` scores every disease by how well its symptom profile accounts for
//! the reported symptoms, ranks the candidates deterministically, and explains
//! each score. Results are an ordering of catalog entries, not a diagnosis.
//!
//! ## Features
//!
//! - **Coverage and recall scoring**: balances how much of a disease profile was
//!   reported against how much of the complaint the disease explains
//! - **Deterministic ranking**: severity and identifier break ties
//! - **Consistency validation**: reports one-sided and dangling cross-references
//! - **Multi-section catalogs**: merges general and specialist sections
//! - **Hot reload**: swaps the knowledge base without disturbing running queries
//!
//! ## Example
//!
//! ```rust,no_run
//! use dx_solver::{MatchingConfig, QuerySession, ValidationPolicy};
//!
//! // Load the embedded knowledge base and validate it once
//! let session = QuerySession::open_embedded(MatchingConfig::default(), ValidationPolicy::Warn).unwrap();
//!
//! // Rank diseases for three reported symptoms
//! let outcome = session.query(["Fever", "Cough", "Shortness of Breath"], Some(5)).unwrap();
//!
//! for candidate in outcome.candidates().iter() {
//!     println!("{}: {:.1}%", candidate.disease, candidate.composite * 100.0);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Knowledge base loading, section merging and validation
//! - [`core`]: Core record and identifier types
//! - [`matching`]: Scoring, ranking and explanations
//! - [`session`]: Thread-safe query facade
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::KnowledgeBase;
pub use catalog::validate::{ValidationPolicy, ValidationReport};
pub use core::record::{DiseaseRecord, SymptomRecord};
pub use core::types::*;
pub use matching::engine::{MatchingConfig, MatchingEngine};
pub use session::QuerySession;
