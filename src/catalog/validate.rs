//! Referential-integrity checks between the disease and symptom catalogs.
//!
//! Every cross-reference is treated as an independent claim made by the record
//! that holds it. For each claim the validator asks two questions:
//!
//! - does the referenced record exist? If not: [`ValidationFinding::DanglingReference`]
//! - does it claim the relationship back? If not: [`ValidationFinding::AsymmetricReference`]
//!
//! The knowledge base is never modified; what to do with findings is up to the
//! caller (see [`ValidationPolicy`]).

use serde::Serialize;

use crate::catalog::store::KnowledgeBase;
use crate::core::types::{CatalogKind, DiseaseId, SymptomId};

/// A record in either catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Disease(DiseaseId),
    Symptom(SymptomId),
}

impl EntityRef {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Disease(id) => id.as_str(),
            Self::Symptom(id) => id.as_str(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> CatalogKind {
        match self {
            Self::Disease(_) => CatalogKind::Disease,
            Self::Symptom(_) => CatalogKind::Symptom,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.id())
    }
}

/// A data-quality problem in the cross-references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationFinding {
    /// `from` lists `to`, but `to` does not list `from`
    AsymmetricReference { from: EntityRef, to: EntityRef },

    /// `from` lists an identifier that has no record in the other catalog
    DanglingReference { from: EntityRef, missing: String },
}

impl ValidationFinding {
    #[must_use]
    pub fn source(&self) -> &EntityRef {
        match self {
            Self::AsymmetricReference { from, .. } | Self::DanglingReference { from, .. } => from,
        }
    }

    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::AsymmetricReference { to, .. } => to.id(),
            Self::DanglingReference { missing, .. } => missing,
        }
    }

    /// Stable ordering key: source id, target id, then disease before symptom
    fn sort_key(&self) -> (&str, &str, CatalogKind) {
        (self.source().id(), self.target_id(), self.source().kind())
    }
}

impl std::fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AsymmetricReference { from, to } => {
                write!(f, "{from} lists {to}, which does not list it back")
            }
            Self::DanglingReference { from, missing } => {
                let other = match from.kind() {
                    CatalogKind::Disease => CatalogKind::Symptom,
                    CatalogKind::Symptom => CatalogKind::Disease,
                };
                write!(f, "{from} lists unknown {other} '{missing}'")
            }
        }
    }
}

/// What a caller does with a non-clean report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ValidationPolicy {
    /// Log the findings and continue
    #[default]
    Warn,
    /// Refuse to serve a knowledge base with any finding
    Strict,
}

/// Ordered list of findings
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn asymmetric(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| matches!(f, ValidationFinding::AsymmetricReference { .. }))
    }

    pub fn dangling(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| matches!(f, ValidationFinding::DanglingReference { .. }))
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} findings ({} asymmetric, {} dangling)",
            self.len(),
            self.asymmetric().count(),
            self.dangling().count()
        )?;
        for finding in &self.findings {
            writeln!(f, "  - {finding}")?;
        }
        Ok(())
    }
}

/// Check both directions of every cross-reference in `kb`.
#[must_use]
pub fn validate(kb: &KnowledgeBase) -> ValidationReport {
    let mut findings = Vec::new();

    for disease in kb.diseases() {
        let from = EntityRef::Disease(disease.id.clone());
        for symptom_id in &disease.related_symptoms {
            match kb.symptom(symptom_id.as_str()) {
                None => findings.push(ValidationFinding::DanglingReference {
                    from: from.clone(),
                    missing: symptom_id.0.clone(),
                }),
                Some(symptom) if !symptom.lists_disease(disease.id.as_str()) => {
                    findings.push(ValidationFinding::AsymmetricReference {
                        from: from.clone(),
                        to: EntityRef::Symptom(symptom_id.clone()),
                    });
                }
                Some(_) => {}
            }
        }
    }

    for symptom in kb.symptoms() {
        let from = EntityRef::Symptom(symptom.id.clone());
        for disease_id in &symptom.related_diseases {
            match kb.disease(disease_id.as_str()) {
                None => findings.push(ValidationFinding::DanglingReference {
                    from: from.clone(),
                    missing: disease_id.0.clone(),
                }),
                Some(disease) if !disease.lists_symptom(symptom.id.as_str()) => {
                    findings.push(ValidationFinding::AsymmetricReference {
                        from: from.clone(),
                        to: EntityRef::Disease(disease_id.clone()),
                    });
                }
                Some(_) => {}
            }
        }
    }

    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    ValidationReport { findings }
}
