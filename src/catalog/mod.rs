//! Knowledge base storage, indexing and consistency checks.
//!
//! The knowledge base holds two catalogs, diseases and symptoms, each record
//! naming related records in the other catalog. Those cross-references are
//! maintained by hand in the source data and do not always agree; the loader
//! indexes each side exactly as written and [`validate`] reports where they
//! disagree.
//!
//! ## Embedded Catalog
//!
//! Two sections are compiled into the binary and merged on load:
//!
//! - **general**: respiratory, gastrointestinal, metabolic, neurological and other common conditions
//! - **cardiology**: coronary, valvular, rhythm and inflammatory heart conditions
//!
//! ## Example
//!
//! ```rust,no_run
//! use dx_solver::catalog::store::KnowledgeBase;
//! use dx_solver::catalog::validate::validate;
//!
//! let kb = KnowledgeBase::load_embedded().unwrap();
//! let pneumonia = kb.disease("Pneumonia");
//!
//! let report = validate(&kb);
//! for finding in &report.findings {
//!     println!("{finding}");
//! }
//! ```
//!
//! ## Custom Catalogs
//!
//! ```rust,no_run
//! use dx_solver::catalog::builder::MergePolicy;
//! use dx_solver::catalog::store::KnowledgeBase;
//! use std::path::PathBuf;
//!
//! let kb = KnowledgeBase::load_from_files(
//!     &[PathBuf::from("general.json"), PathBuf::from("my_section.json")],
//!     MergePolicy::Union,
//! )
//! .unwrap();
//! ```
//!
//! [`validate`]: validate::validate

pub mod builder;
pub mod index;
pub mod store;
pub mod validate;
