use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::catalog::builder::{BuilderError, KnowledgeBaseBuilder, MergePolicy};
use crate::core::record::{DiseaseRecord, RawDiseaseRecord, RawSymptomRecord, SymptomRecord};
use crate::core::types::{CatalogKind, DiseaseId, Severity, SymptomId};
use crate::utils::validation::is_valid_identifier;

/// Fatal problems with the raw records handed to [`KnowledgeBase::load`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Duplicate {kind} identifier '{id}'")]
    DuplicateIdentifier { kind: CatalogKind, id: String },

    #[error("The {kind} '{id}' has a missing or unrecognized '{field}' field")]
    MissingField {
        kind: CatalogKind,
        id: String,
        field: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to assemble catalog sections: {0}")]
    Build(#[from] BuilderError),

    #[error("Invalid catalog: {0}")]
    Load(#[from] LoadError),
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Sections compiled into the binary, in merge order
const EMBEDDED_SECTIONS: [&str; 2] = [
    include_str!("../../catalogs/general.json"),
    include_str!("../../catalogs/cardiology.json"),
];

/// Serializable catalog section format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    pub version: String,

    /// Section name, e.g. "general" or "cardiology"
    pub section: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default)]
    pub diseases: Vec<RawDiseaseRecord>,

    #[serde(default)]
    pub symptoms: Vec<RawSymptomRecord>,
}

impl CatalogSection {
    /// Parse a section from a JSON string
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the document does not have the section shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a section file
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ReadError` or `CatalogError::ParseError`.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}

/// The immutable knowledge base with its lookup indexes.
///
/// Built once by [`KnowledgeBase::load`]; nothing mutates it afterwards, so a
/// single instance can be shared by any number of readers.
#[derive(Debug)]
pub struct KnowledgeBase {
    /// All diseases, in load order
    diseases: Vec<DiseaseRecord>,

    /// All symptoms, in load order
    symptoms: Vec<SymptomRecord>,

    /// Index: disease ID -> index in diseases vec
    disease_index: HashMap<DiseaseId, usize>,

    /// Index: symptom ID -> index in symptoms vec
    symptom_index: HashMap<SymptomId, usize>,

    /// Adjacency claimed by symptom records: symptom -> related diseases
    pub symptom_to_diseases: HashMap<SymptomId, BTreeSet<DiseaseId>>,

    /// Adjacency claimed by disease records: disease -> related symptoms
    pub disease_to_symptoms: HashMap<DiseaseId, BTreeSet<SymptomId>>,

    /// Inverse of `disease_to_symptoms`: symptom -> indices of diseases listing it.
    /// Includes symptom identifiers that have no record of their own.
    pub listed_by_diseases: HashMap<SymptomId, Vec<usize>>,
}

impl KnowledgeBase {
    /// Validate and index two raw catalogs.
    ///
    /// Related-entity lists are indexed exactly as each record states them;
    /// symmetry between the two sides is not assumed.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::DuplicateIdentifier` if an identifier occurs twice in
    /// one catalog, or `LoadError::MissingField` if an identifier is blank or a
    /// severity or category is absent or unrecognized. Nothing is returned on
    /// error; a partially built knowledge base never escapes.
    pub fn load(
        disease_records: impl IntoIterator<Item = RawDiseaseRecord>,
        symptom_records: impl IntoIterator<Item = RawSymptomRecord>,
    ) -> Result<Self, LoadError> {
        let mut kb = Self {
            diseases: Vec::new(),
            symptoms: Vec::new(),
            disease_index: HashMap::new(),
            symptom_index: HashMap::new(),
            symptom_to_diseases: HashMap::new(),
            disease_to_symptoms: HashMap::new(),
            listed_by_diseases: HashMap::new(),
        };

        for raw in disease_records {
            let record = validate_disease(raw)?;
            kb.add_disease(record)?;
        }

        for raw in symptom_records {
            let record = validate_symptom(raw)?;
            kb.add_symptom(record)?;
        }

        debug!(
            diseases = kb.diseases.len(),
            symptoms = kb.symptoms.len(),
            disease_edges = kb.disease_to_symptoms.values().map(BTreeSet::len).sum::<usize>(),
            symptom_edges = kb.symptom_to_diseases.values().map(BTreeSet::len).sum::<usize>(),
            "Loaded knowledge base"
        );

        Ok(kb)
    }

    /// Load the sections compiled into the binary, merged with [`MergePolicy::Union`]
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if an embedded section fails to parse or load.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Union);
        for json in EMBEDDED_SECTIONS {
            builder.add_section_json(json)?;
        }
        Ok(builder.build()?)
    }

    /// Load a single section file
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the file cannot be read, parsed or loaded.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        Self::load_from_files(&[path.to_path_buf()], MergePolicy::Strict)
    }

    /// Load and merge several section files in the given order
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if any file cannot be read or parsed, or if the
    /// merged records fail to load.
    pub fn load_from_files(paths: &[PathBuf], policy: MergePolicy) -> Result<Self, CatalogError> {
        let mut builder = KnowledgeBaseBuilder::new(policy);
        for path in paths {
            builder.add_section_file(path)?;
        }
        Ok(builder.build()?)
    }

    /// Parse a single section from a JSON string
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the JSON is malformed or the records fail to load.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Strict);
        builder.add_section_json(json)?;
        Ok(builder.build()?)
    }

    fn add_disease(&mut self, record: DiseaseRecord) -> Result<(), LoadError> {
        if self.disease_index.contains_key(&record.id) {
            return Err(LoadError::DuplicateIdentifier {
                kind: CatalogKind::Disease,
                id: record.id.0,
            });
        }

        let index = self.diseases.len();
        self.disease_index.insert(record.id.clone(), index);

        for symptom in &record.related_symptoms {
            self.listed_by_diseases
                .entry(symptom.clone())
                .or_default()
                .push(index);
        }
        self.disease_to_symptoms
            .insert(record.id.clone(), record.related_symptoms.clone());

        self.diseases.push(record);
        Ok(())
    }

    fn add_symptom(&mut self, record: SymptomRecord) -> Result<(), LoadError> {
        if self.symptom_index.contains_key(&record.id) {
            return Err(LoadError::DuplicateIdentifier {
                kind: CatalogKind::Symptom,
                id: record.id.0,
            });
        }

        self.symptom_index
            .insert(record.id.clone(), self.symptoms.len());
        self.symptom_to_diseases
            .insert(record.id.clone(), record.related_diseases.clone());

        self.symptoms.push(record);
        Ok(())
    }

    /// Get a disease by identifier
    pub fn disease(&self, id: &str) -> Option<&DiseaseRecord> {
        self.disease_index.get(id).map(|&idx| &self.diseases[idx])
    }

    /// Get a symptom by identifier
    pub fn symptom(&self, id: &str) -> Option<&SymptomRecord> {
        self.symptom_index.get(id).map(|&idx| &self.symptoms[idx])
    }

    pub fn contains_symptom(&self, id: &str) -> bool {
        self.symptom_index.contains_key(id)
    }

    pub fn diseases(&self) -> impl Iterator<Item = &DiseaseRecord> {
        self.diseases.iter()
    }

    pub fn symptoms(&self) -> impl Iterator<Item = &SymptomRecord> {
        self.symptoms.iter()
    }

    /// Diseases whose own record lists `symptom`
    pub fn diseases_listing(&self, symptom: &str) -> impl Iterator<Item = &DiseaseRecord> {
        self.listed_by_diseases
            .get(symptom)
            .into_iter()
            .flatten()
            .map(|&idx| &self.diseases[idx])
    }

    /// Names of all sections records were loaded from
    pub fn sections(&self) -> BTreeSet<&str> {
        self.diseases
            .iter()
            .filter_map(|d| d.section.as_deref())
            .chain(self.symptoms.iter().filter_map(|s| s.section.as_deref()))
            .collect()
    }

    /// Export the knowledge base as a single merged section
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogSection {
            version: CATALOG_VERSION.to_string(),
            section: "merged".to_string(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            diseases: self.diseases.iter().map(RawDiseaseRecord::from).collect(),
            symptoms: self.symptoms.iter().map(RawSymptomRecord::from).collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    pub fn disease_count(&self) -> usize {
        self.diseases.len()
    }

    pub fn symptom_count(&self) -> usize {
        self.symptoms.len()
    }

    /// True when both catalogs are empty
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty() && self.symptoms.is_empty()
    }
}

fn validate_disease(raw: RawDiseaseRecord) -> Result<DiseaseRecord, LoadError> {
    let kind = CatalogKind::Disease;
    check_identifier(kind, &raw.id)?;
    let severity = parse_severity(kind, &raw.id, raw.severity.as_deref())?;
    let category = parse_category(kind, &raw.id, raw.category)?;

    Ok(DiseaseRecord {
        related_symptoms: raw.related_symptoms.into_iter().map(SymptomId).collect(),
        id: DiseaseId(raw.id),
        name_secondary: raw.name_secondary,
        description: raw.description,
        severity,
        category,
        section: raw.section,
    })
}

fn validate_symptom(raw: RawSymptomRecord) -> Result<SymptomRecord, LoadError> {
    let kind = CatalogKind::Symptom;
    check_identifier(kind, &raw.id)?;
    let severity = parse_severity(kind, &raw.id, raw.severity.as_deref())?;
    let category = parse_category(kind, &raw.id, raw.category)?;

    Ok(SymptomRecord {
        related_diseases: raw.related_diseases.into_iter().map(DiseaseId).collect(),
        id: SymptomId(raw.id),
        name_secondary: raw.name_secondary,
        description: raw.description,
        severity,
        category,
        section: raw.section,
    })
}

fn check_identifier(kind: CatalogKind, id: &str) -> Result<(), LoadError> {
    if is_valid_identifier(id) {
        Ok(())
    } else {
        Err(LoadError::MissingField {
            kind,
            id: id.to_string(),
            field: "id",
        })
    }
}

fn parse_severity(kind: CatalogKind, id: &str, value: Option<&str>) -> Result<Severity, LoadError> {
    value
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| LoadError::MissingField {
            kind,
            id: id.to_string(),
            field: "severity",
        })
}

fn parse_category(kind: CatalogKind, id: &str, value: Option<String>) -> Result<String, LoadError> {
    match value {
        Some(category) if !category.trim().is_empty() => Ok(category),
        _ => Err(LoadError::MissingField {
            kind,
            id: id.to_string(),
            field: "category",
        }),
    }
}
