use std::collections::{BTreeSet, HashMap};

use crate::core::record::DiseaseRecord;
use crate::core::types::SymptomId;

use super::store::KnowledgeBase;

/// Finds diseases that share at least one symptom with a query
pub struct CandidateFinder<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Diseases whose record lists any of `symptoms`, with the number of
    /// listed symptoms each one shares with the query.
    ///
    /// Only the disease-side claims are consulted. Results are sorted by
    /// overlap (descending), then disease id.
    pub fn find_candidates(&self, symptoms: &BTreeSet<SymptomId>) -> Vec<(&'a DiseaseRecord, usize)> {
        let mut counts: HashMap<&str, (&'a DiseaseRecord, usize)> = HashMap::new();

        for symptom in symptoms {
            for disease in self.kb.diseases_listing(symptom.as_str()) {
                counts
                    .entry(disease.id.as_str())
                    .or_insert((disease, 0))
                    .1 += 1;
            }
        }

        let mut candidates: Vec<_> = counts.into_values().collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        candidates
    }
}
