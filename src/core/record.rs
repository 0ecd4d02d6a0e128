use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::types::{DiseaseId, Severity, SymptomId};

/// A pair of texts in the primary and secondary catalog languages.
///
/// Presentation data only: never parsed or compared by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl LocalizedText {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: Some(primary.into()),
            secondary: Some(secondary.into()),
        }
    }
}

/// A disease record as it appears in a catalog section, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDiseaseRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,

    #[serde(default)]
    pub description: LocalizedText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub related_symptoms: Vec<String>,

    /// Section the record was read from; filled in by the section builder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl RawDiseaseRecord {
    pub fn new(id: impl Into<String>, severity: &str, category: &str) -> Self {
        Self {
            id: id.into(),
            severity: Some(severity.to_string()),
            category: Some(category.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_symptoms<S: AsRef<str>>(mut self, symptoms: &[S]) -> Self {
        self.related_symptoms = symptoms.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }
}

/// A symptom record as it appears in a catalog section, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSymptomRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,

    #[serde(default)]
    pub description: LocalizedText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub related_diseases: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl RawSymptomRecord {
    pub fn new(id: impl Into<String>, severity: &str, category: &str) -> Self {
        Self {
            id: id.into(),
            severity: Some(severity.to_string()),
            category: Some(category.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_diseases<S: AsRef<str>>(mut self, diseases: &[S]) -> Self {
        self.related_diseases = diseases.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }
}

/// A validated disease in the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub id: DiseaseId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,

    pub description: LocalizedText,

    pub severity: Severity,

    pub category: String,

    /// Symptoms this disease claims; may name symptoms with no record
    pub related_symptoms: BTreeSet<SymptomId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl DiseaseRecord {
    #[must_use]
    pub fn lists_symptom(&self, symptom: &str) -> bool {
        self.related_symptoms.contains(symptom)
    }
}

/// A validated symptom in the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub id: SymptomId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,

    pub description: LocalizedText,

    pub severity: Severity,

    pub category: String,

    /// Diseases this symptom claims; may name diseases with no record
    pub related_diseases: BTreeSet<DiseaseId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl SymptomRecord {
    #[must_use]
    pub fn lists_disease(&self, disease: &str) -> bool {
        self.related_diseases.contains(disease)
    }
}

impl From<&DiseaseRecord> for RawDiseaseRecord {
    fn from(record: &DiseaseRecord) -> Self {
        Self {
            id: record.id.0.clone(),
            name_secondary: record.name_secondary.clone(),
            description: record.description.clone(),
            severity: Some(record.severity.to_string()),
            category: Some(record.category.clone()),
            related_symptoms: record.related_symptoms.iter().map(|s| s.0.clone()).collect(),
            section: record.section.clone(),
        }
    }
}

impl From<&SymptomRecord> for RawSymptomRecord {
    fn from(record: &SymptomRecord) -> Self {
        Self {
            id: record.id.0.clone(),
            name_secondary: record.name_secondary.clone(),
            description: record.description.clone(),
            severity: Some(record.severity.to_string()),
            category: Some(record.category.clone()),
            related_diseases: record.related_diseases.iter().map(|d| d.0.clone()).collect(),
            section: record.section.clone(),
        }
    }
}
