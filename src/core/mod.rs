//! Core data types for the symptom knowledge base.
//!
//! - [`DiseaseId`], [`SymptomId`]: identifiers for the two keyed spaces
//! - [`Severity`]: the four-level ordinal shared by both catalogs
//! - [`RawDiseaseRecord`], [`RawSymptomRecord`]: records as read from a catalog section
//! - [`DiseaseRecord`], [`SymptomRecord`]: validated records held by the knowledge base
//! - [`Confidence`]: result classification
//!
//! ## Identifiers
//!
//! Identifiers are the primary-language names used in the source catalogs
//! (e.g. `"Shortness of Breath"`). Matching is exact and case-sensitive;
//! `"Fever"` and `"Low-Grade Fever"` are unrelated symptoms.
//!
//! [`DiseaseId`]: types::DiseaseId
//! [`SymptomId`]: types::SymptomId
//! [`Severity`]: types::Severity
//! [`Confidence`]: types::Confidence
//! [`RawDiseaseRecord`]: record::RawDiseaseRecord
//! [`RawSymptomRecord`]: record::RawSymptomRecord
//! [`DiseaseRecord`]: record::DiseaseRecord
//! [`SymptomRecord`]: record::SymptomRecord

pub mod record;
pub mod types;
