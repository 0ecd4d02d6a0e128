//! Knowledge base builder for assembling one catalog from several sections.
//!
//! The shipped knowledge base is split into sections (general medicine and
//! cardiology) that define some of the same symptoms. `KnowledgeBaseBuilder`
//! collates the raw records of every section and, depending on the
//! [`MergePolicy`], either leaves cross-section duplicates for the loader to
//! reject or folds them into a single record.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::store::{CatalogSection, KnowledgeBase, LoadError, CATALOG_VERSION};
use crate::core::record::{RawDiseaseRecord, RawSymptomRecord};
use crate::core::types::{CatalogKind, Severity};

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Parse error in section {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("No sections added")]
    Empty,

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// How records that appear in more than one section are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MergePolicy {
    /// Keep every record; the loader rejects cross-section duplicates
    #[default]
    Strict,
    /// Fold a duplicate into its first occurrence: related sets are unioned,
    /// the higher severity wins, other fields keep their first value
    Union,
}

/// Record of one section added to the builder
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub name: String,
    pub version: String,
    pub diseases: usize,
    pub symptoms: usize,
    pub merged: usize,
}

/// Assembles raw records from catalog sections
#[derive(Debug, Default)]
pub struct KnowledgeBaseBuilder {
    policy: MergePolicy,
    diseases: Vec<RawDiseaseRecord>,
    symptoms: Vec<RawSymptomRecord>,

    /// id -> (position in `diseases`, section it was first seen in)
    disease_slots: HashMap<String, (usize, String)>,
    symptom_slots: HashMap<String, (usize, String)>,

    sections: Vec<SectionRecord>,
    merges: Vec<String>,
}

impl KnowledgeBaseBuilder {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Parse and add a section from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::Parse` if the JSON is not a catalog section.
    pub fn add_section_json(&mut self, json: &str) -> Result<(), BuilderError> {
        let section = CatalogSection::from_json(json).map_err(|source| BuilderError::Parse {
            origin: "<inline>".to_string(),
            source,
        })?;
        self.add_section(section);
        Ok(())
    }

    /// Read and add a section file
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::Io` if the file cannot be read, or
    /// `BuilderError::Parse` if it is not a catalog section.
    pub fn add_section_file(&mut self, path: &Path) -> Result<(), BuilderError> {
        let content = std::fs::read_to_string(path).map_err(|source| BuilderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let section = CatalogSection::from_json(&content).map_err(|source| BuilderError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        self.add_section(section);
        Ok(())
    }

    /// Add an already parsed section.
    ///
    /// Records are tagged with the section name. Duplicates inside the section
    /// itself are always kept so the loader reports them.
    pub fn add_section(&mut self, section: CatalogSection) {
        if section.version != CATALOG_VERSION {
            warn!(
                section = %section.section,
                expected = CATALOG_VERSION,
                found = %section.version,
                "Catalog section version mismatch"
            );
        }

        let name = section.section;
        let mut record = SectionRecord {
            name: name.clone(),
            version: section.version,
            diseases: section.diseases.len(),
            symptoms: section.symptoms.len(),
            merged: 0,
        };

        // Ids already seen in this section; a repeat is never merged
        let mut seen_diseases = HashSet::new();
        let mut seen_symptoms = HashSet::new();

        for mut disease in section.diseases {
            disease.section = Some(name.clone());
            if seen_diseases.insert(disease.id.clone()) && self.merge_disease(&disease, &name) {
                record.merged += 1;
                continue;
            }
            let slot = self.diseases.len();
            self.disease_slots
                .entry(disease.id.clone())
                .or_insert_with(|| (slot, name.clone()));
            self.diseases.push(disease);
        }

        for mut symptom in section.symptoms {
            symptom.section = Some(name.clone());
            if seen_symptoms.insert(symptom.id.clone()) && self.merge_symptom(&symptom, &name) {
                record.merged += 1;
                continue;
            }
            let slot = self.symptoms.len();
            self.symptom_slots
                .entry(symptom.id.clone())
                .or_insert_with(|| (slot, name.clone()));
            self.symptoms.push(symptom);
        }

        self.sections.push(record);
    }

    /// Try to fold `incoming` into an earlier disease from another section.
    /// Returns true if it was merged.
    fn merge_disease(&mut self, incoming: &RawDiseaseRecord, section: &str) -> bool {
        let Some((slot, first_section)) =
            self.cross_section_slot(CatalogKind::Disease, &incoming.id, section)
        else {
            return false;
        };

        let existing = &mut self.diseases[slot];
        existing.severity = max_severity(existing.severity.take(), incoming.severity.as_deref());
        for symptom in &incoming.related_symptoms {
            if !existing.related_symptoms.contains(symptom) {
                existing.related_symptoms.push(symptom.clone());
            }
        }

        self.note_merge(CatalogKind::Disease, &incoming.id, &first_section, section);
        true
    }

    fn merge_symptom(&mut self, incoming: &RawSymptomRecord, section: &str) -> bool {
        let Some((slot, first_section)) =
            self.cross_section_slot(CatalogKind::Symptom, &incoming.id, section)
        else {
            return false;
        };

        let existing = &mut self.symptoms[slot];
        existing.severity = max_severity(existing.severity.take(), incoming.severity.as_deref());
        for disease in &incoming.related_diseases {
            if !existing.related_diseases.contains(disease) {
                existing.related_diseases.push(disease.clone());
            }
        }

        self.note_merge(CatalogKind::Symptom, &incoming.id, &first_section, section);
        true
    }

    /// Slot of an earlier record with the same id, if it came from a different
    /// section and the policy allows merging
    fn cross_section_slot(
        &self,
        kind: CatalogKind,
        id: &str,
        section: &str,
    ) -> Option<(usize, String)> {
        if self.policy != MergePolicy::Union {
            return None;
        }
        let slots = match kind {
            CatalogKind::Disease => &self.disease_slots,
            CatalogKind::Symptom => &self.symptom_slots,
        };
        slots
            .get(id)
            .filter(|(_, first)| first != section)
            .cloned()
    }

    fn note_merge(&mut self, kind: CatalogKind, id: &str, first: &str, second: &str) {
        info!(%kind, id, first, second, "Merged record defined in two sections");
        self.merges
            .push(format!("{kind} '{id}' from '{second}' merged into '{first}'"));
    }

    /// Load the collected records into a knowledge base
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::Empty` if no section was added, or
    /// `BuilderError::Load` if the records fail validation.
    pub fn build(self) -> Result<KnowledgeBase, BuilderError> {
        if self.sections.is_empty() {
            return Err(BuilderError::Empty);
        }
        Ok(KnowledgeBase::load(self.diseases, self.symptoms)?)
    }

    /// Get summary of build
    #[must_use]
    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            policy: self.policy,
            sections: self.sections.clone(),
            total_diseases: self.diseases.len(),
            total_symptoms: self.symptoms.len(),
            merges: self.merges.clone(),
        }
    }
}

/// Higher of two severity strings. Unparseable values are kept as-is so the
/// loader can report them.
fn max_severity(existing: Option<String>, incoming: Option<&str>) -> Option<String> {
    let parse = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<Severity>().ok());
    let incoming = incoming.map(str::to_string);
    match (parse(&existing), parse(&incoming)) {
        (Some(a), Some(b)) if b > a => incoming,
        (None, Some(_)) if existing.is_none() => incoming,
        _ => existing,
    }
}

/// Summary of the build process
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub policy: MergePolicy,
    pub sections: Vec<SectionRecord>,
    pub total_diseases: usize,
    pub total_symptoms: usize,
    pub merges: Vec<String>,
}

impl std::fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Knowledge Base Builder Summary")?;
        writeln!(f, "==============================")?;
        writeln!(f, "Policy: {:?}", self.policy)?;
        writeln!(f)?;

        writeln!(f, "Sections:")?;
        for (i, section) in self.sections.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {} (v{}) -> {} diseases, {} symptoms, {} merged",
                i + 1,
                section.name,
                section.version,
                section.diseases,
                section.symptoms,
                section.merged
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Diseases: {}", self.total_diseases)?;
        writeln!(f, "Symptoms: {}", self.total_symptoms)?;

        writeln!(f, "Merges: {}", self.merges.len())?;
        for merge in &self.merges {
            writeln!(f, "  - {merge}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(
        name: &str,
        diseases: Vec<RawDiseaseRecord>,
        symptoms: Vec<RawSymptomRecord>,
    ) -> CatalogSection {
        CatalogSection {
            version: CATALOG_VERSION.to_string(),
            section: name.to_string(),
            created_at: None,
            diseases,
            symptoms,
        }
    }

    fn general() -> CatalogSection {
        section(
            "general",
            vec![RawDiseaseRecord::new("Influenza", "moderate", "Respiratory Infection")
                .with_symptoms(&["Fever", "Cough"])],
            vec![RawSymptomRecord::new("Fever", "moderate", "Systemic")
                .with_diseases(&["Influenza", "Malaria"])],
        )
    }

    fn cardiology() -> CatalogSection {
        section(
            "cardiology",
            vec![RawDiseaseRecord::new("Myocarditis", "high", "Inflammatory Heart Disease")
                .with_symptoms(&["Fever", "Chest Pain"])],
            vec![RawSymptomRecord::new("Fever", "high", "Inflammatory")
                .with_diseases(&["Myocarditis", "Influenza"])],
        )
    }

    #[test]
    fn test_strict_policy_rejects_cross_section_duplicates() {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Strict);
        builder.add_section(general());
        builder.add_section(cardiology());

        let err = builder.build().unwrap_err();
        assert!(matches!(
            err,
            BuilderError::Load(LoadError::DuplicateIdentifier {
                kind: CatalogKind::Symptom,
                ..
            })
        ));
    }

    #[test]
    fn test_union_policy_merges_duplicates() {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Union);
        builder.add_section(general());
        builder.add_section(cardiology());

        let summary = builder.summary();
        assert_eq!(summary.merges.len(), 1);
        assert_eq!(summary.sections[1].merged, 1);

        let kb = builder.build().unwrap();
        let fever = kb.symptom("Fever").unwrap();

        // First occurrence keeps its text and section; severity takes the max
        assert_eq!(fever.category, "Systemic");
        assert_eq!(fever.section.as_deref(), Some("general"));
        assert_eq!(fever.severity, Severity::High);

        let related: Vec<&str> = fever.related_diseases.iter().map(|d| d.as_str()).collect();
        assert_eq!(related, vec!["Influenza", "Malaria", "Myocarditis"]);
    }

    #[test]
    fn test_union_policy_keeps_in_section_duplicates() {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Union);
        let mut dup = general();
        dup.symptoms.push(RawSymptomRecord::new("Fever", "low", "Systemic"));
        builder.add_section(dup);

        assert!(matches!(
            builder.build().unwrap_err(),
            BuilderError::Load(LoadError::DuplicateIdentifier { .. })
        ));
    }

    #[test]
    fn test_records_are_tagged_with_section() {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Union);
        builder.add_section(general());
        builder.add_section(cardiology());
        let kb = builder.build().unwrap();

        assert_eq!(kb.disease("Influenza").unwrap().section.as_deref(), Some("general"));
        assert_eq!(kb.disease("Myocarditis").unwrap().section.as_deref(), Some("cardiology"));
    }

    #[test]
    fn test_empty_builder() {
        let builder = KnowledgeBaseBuilder::new(MergePolicy::Strict);
        assert!(matches!(builder.build(), Err(BuilderError::Empty)));
    }

    #[test]
    fn test_add_section_json_parse_error() {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Strict);
        let err = builder.add_section_json("{ not json").unwrap_err();
        assert!(matches!(err, BuilderError::Parse { .. }));
    }

    #[test]
    fn test_max_severity() {
        let s = |v: &str| Some(v.to_string());
        assert_eq!(max_severity(s("low"), Some("high")), s("high"));
        assert_eq!(max_severity(s("critical"), Some("high")), s("critical"));
        assert_eq!(max_severity(None, Some("moderate")), s("moderate"));
        assert_eq!(max_severity(s("bogus"), Some("high")), s("bogus"));
    }

    #[test]
    fn test_summary_display() {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Union);
        builder.add_section(general());
        builder.add_section(cardiology());
        let text = builder.summary().to_string();

        assert!(text.contains("general"));
        assert!(text.contains("cardiology"));
        assert!(text.contains("Merges: 1"));
    }
}
