use serde::Serialize;

use crate::catalog::store::KnowledgeBase;
use crate::core::record::DiseaseRecord;
use crate::core::types::{DiseaseId, SymptomId};
use crate::matching::scoring::MatchScore;

/// Human-readable rationale for one disease's score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub disease: DiseaseId,

    /// One-sentence verdict
    pub summary: String,

    /// Bullet points, most important first
    pub details: Vec<String>,

    /// Matched symptoms whose own record does not list the disease back
    pub asymmetric_evidence: Vec<SymptomId>,
}

impl Explanation {
    /// Build the rationale for `score`, which must have been computed for `disease`.
    ///
    /// `kb` is consulted for the reverse side of each matched symptom.
    #[must_use]
    pub fn build(score: &MatchScore, disease: &DiseaseRecord, kb: &KnowledgeBase) -> Self {
        let summary = if score.has_evidence() {
            format!(
                "{} accounts for {} of {} reported symptoms and {} of its {} listed symptoms \
                 (score {:.1}%, confidence {})",
                disease.id,
                score.matched_count,
                score.reported_count,
                score.matched_count,
                score.expected_count,
                score.composite * 100.0,
                score.confidence.label(),
            )
        } else {
            format!(
                "{} does not list any of the {} reported symptoms",
                disease.id, score.reported_count
            )
        };

        let mut details = Vec::new();
        if !score.matched.is_empty() {
            details.push(format!("Matched: {}", join(&score.matched)));
        }
        if !score.missing.is_empty() {
            details.push(format!("Expected but not reported: {}", join(&score.missing)));
        }
        details.push(format!(
            "Coverage {:.1}%, recall {:.1}%",
            score.coverage * 100.0,
            score.recall * 100.0
        ));
        details.push(format!(
            "Severity: {} ({})",
            disease.severity, disease.category
        ));
        if let Some(text) = &disease.description.primary {
            details.push(text.clone());
        }

        let asymmetric_evidence: Vec<SymptomId> = score
            .matched
            .iter()
            .filter(|s| {
                kb.symptom(s.as_str())
                    .is_some_and(|record| !record.lists_disease(disease.id.as_str()))
            })
            .cloned()
            .collect();

        for symptom in &asymmetric_evidence {
            details.push(format!(
                "Note: the record for '{symptom}' does not list {} in return",
                disease.id
            ));
        }

        Self {
            disease: disease.id.clone(),
            summary,
            details,
            asymmetric_evidence,
        }
    }
}

impl std::fmt::Display for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.summary)?;
        for line in &self.details {
            writeln!(f, "  - {line}")?;
        }
        Ok(())
    }
}

fn join<'a>(ids: impl IntoIterator<Item = &'a SymptomId>) -> String {
    ids.into_iter()
        .map(SymptomId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RawDiseaseRecord, RawSymptomRecord};
    use std::collections::BTreeSet;

    fn make_test_kb() -> KnowledgeBase {
        KnowledgeBase::load(
            vec![RawDiseaseRecord::new("Flu", "moderate", "Infection")
                .with_symptoms(&["Fever", "Cough", "Fatigue"])],
            vec![
                RawSymptomRecord::new("Fever", "low", "General").with_diseases(&["Flu"]),
                // Does not list Flu back
                RawSymptomRecord::new("Cough", "low", "Respiratory"),
                RawSymptomRecord::new("Fatigue", "low", "General").with_diseases(&["Flu"]),
            ],
        )
        .unwrap()
    }

    fn query(ids: &[&str]) -> BTreeSet<SymptomId> {
        ids.iter().map(|s| SymptomId::new(*s)).collect()
    }

    #[test]
    fn test_explanation_names_matched_and_missing() {
        let kb = make_test_kb();
        let flu = kb.disease("Flu").unwrap();
        let score = MatchScore::calculate(flu, &query(&["Fever"]));
        let explanation = Explanation::build(&score, flu, &kb);

        assert!(explanation.summary.starts_with("Flu accounts for 1 of 1 reported symptoms"));
        assert!(explanation.details.contains(&"Matched: Fever".to_string()));
        assert!(explanation
            .details
            .contains(&"Expected but not reported: Cough, Fatigue".to_string()));
        assert!(explanation.details.contains(&"Severity: moderate (Infection)".to_string()));
        assert!(explanation.asymmetric_evidence.is_empty());
    }

    #[test]
    fn test_asymmetric_evidence_note() {
        let kb = make_test_kb();
        let flu = kb.disease("Flu").unwrap();
        let score = MatchScore::calculate(flu, &query(&["Fever", "Cough"]));
        let explanation = Explanation::build(&score, flu, &kb);

        assert_eq!(explanation.asymmetric_evidence, vec![SymptomId::new("Cough")]);
        assert!(explanation
            .to_string()
            .contains("the record for 'Cough' does not list Flu in return"));
    }

    #[test]
    fn test_explanation_without_evidence() {
        let kb = make_test_kb();
        let flu = kb.disease("Flu").unwrap();
        let score = MatchScore::calculate(flu, &query(&["Headache"]));
        let explanation = Explanation::build(&score, flu, &kb);

        assert_eq!(
            explanation.summary,
            "Flu does not list any of the 1 reported symptoms"
        );
        assert!(!explanation.details.iter().any(|d| d.starts_with("Matched")));
    }
}
