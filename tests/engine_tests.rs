//! End-to-end behaviour of the inference engine through the public API.

use std::collections::BTreeSet;

use dx_solver::catalog::builder::{BuilderError, KnowledgeBaseBuilder, MergePolicy};
use dx_solver::catalog::store::{CatalogError, KnowledgeBase, LoadError};
use dx_solver::catalog::validate::{validate, EntityRef, ValidationFinding};
use dx_solver::core::record::{RawDiseaseRecord, RawSymptomRecord};
use dx_solver::matching::{rank, MatchingConfig, MatchingEngine, QueryError, QueryNotice};
use dx_solver::{CatalogKind, DiseaseId, QuerySession, Severity, SymptomId, ValidationPolicy};

fn ranked_ids(kb: &KnowledgeBase, symptoms: &[&str]) -> Vec<String> {
    let engine = MatchingEngine::new(kb);
    let scores = engine.score(symptoms).unwrap();
    scores.rank(None).iter().map(|c| c.disease.0).collect()
}

#[test]
fn test_respiratory_complaint_on_embedded_catalog() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let engine = MatchingEngine::new(&kb);
    let scores = engine
        .score(["Fever", "Cough", "Shortness of Breath"])
        .unwrap();

    let pneumonia = &scores.scores["Pneumonia"];
    assert_eq!(pneumonia.matched_count, 2);
    assert_eq!(pneumonia.expected_count, 5);
    assert!((pneumonia.composite - 0.5).abs() < 1e-9);

    let cold = &scores.scores["Common Cold"];
    assert_eq!(cold.matched_count, 1);
    assert_eq!(cold.expected_count, 6);
    assert!((cold.composite - 2.0 / 9.0).abs() < 1e-9);

    let order: Vec<String> = scores.rank(None).iter().map(|c| c.disease.0).collect();
    let pos = |id: &str| order.iter().position(|d| d == id).unwrap();
    assert!(pos("Pneumonia") < pos("Common Cold"));
    assert_eq!(order[0], "COVID-19");
    assert_eq!(order.last().map(String::as_str), Some("Common Cold"));
}

#[test]
fn test_severity_then_identifier_breaks_ties_on_embedded_catalog() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let order = ranked_ids(&kb, &["Fever", "Cough", "Shortness of Breath"]);

    // Five diseases share 2 of 6; critical first, then high by name, then moderate
    let tied: Vec<&str> = order[3..8].iter().map(String::as_str).collect();
    assert_eq!(
        tied,
        vec![
            "Infective Endocarditis",
            "Congestive Heart Failure",
            "Heart Failure",
            "Myocarditis",
            "Influenza",
        ]
    );
}

#[test]
fn test_ranking_is_deterministic() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let a = ranked_ids(&kb, &["Chest Pain", "Fatigue", "Palpitations"]);
    let b = ranked_ids(&kb, &["Palpitations", "Chest Pain", "Fatigue", "Fatigue"]);
    assert_eq!(a, b);

    let engine = MatchingEngine::new(&kb);
    let scores = engine.score(["Chest Pain", "Fatigue"]).unwrap();
    let ranking = rank(&scores.scores, Some(5));
    let first: Vec<_> = ranking.iter().collect();
    let second: Vec<_> = ranking.iter().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn test_adding_a_matching_symptom_never_lowers_a_score() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let engine = MatchingEngine::new(&kb);

    let before = engine.score(["Fever", "Headache"]).unwrap();
    let after = engine.score(["Fever", "Headache", "Cough"]).unwrap();

    for disease in kb.diseases_listing("Cough") {
        if let Some(old) = before.scores.get(disease.id.as_str()) {
            let new = &after.scores[disease.id.as_str()];
            assert!(
                new.composite >= old.composite,
                "{} dropped from {} to {}",
                disease.id,
                old.composite,
                new.composite
            );
        }
    }

    // The result set only grows
    for id in before.scores.keys() {
        assert!(after.scores.contains_key(id), "{id} disappeared");
    }
}

#[test]
fn test_zero_evidence_diseases_are_excluded() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let engine = MatchingEngine::new(&kb);
    let scores = engine.score(["Jaundice"]).unwrap();

    assert!(!scores.is_empty());
    for score in scores.scores.values() {
        assert!(score.matched_count > 0);
        assert!(score.matched.contains("Jaundice"));
    }
    assert!(scores.scores.len() < kb.disease_count());
}

#[test]
fn test_unknown_symptoms_do_not_abort_query() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let engine = MatchingEngine::new(&kb);
    let scores = engine.score(["Fever", "Purple Tongue", "fever"]).unwrap();

    assert_eq!(
        scores.notices,
        vec![
            QueryNotice::UnknownSymptom(SymptomId::new("Purple Tongue")),
            QueryNotice::UnknownSymptom(SymptomId::new("fever")),
        ]
    );
    assert_eq!(scores.reported.len(), 1);
    assert!(!scores.is_empty());

    assert!(matches!(
        engine.score(["Purple Tongue"]),
        Err(QueryError::EmptyQuery { .. })
    ));
}

#[test]
fn test_validator_finds_exactly_one_asymmetry() {
    let kb = KnowledgeBase::load(
        vec![
            RawDiseaseRecord::new("D1", "moderate", "Test").with_symptoms(&["S1"]),
            RawDiseaseRecord::new("D2", "low", "Test").with_symptoms(&["S2"]),
        ],
        vec![
            RawSymptomRecord::new("S1", "low", "Test"),
            RawSymptomRecord::new("S2", "low", "Test").with_diseases(&["D2"]),
        ],
    )
    .unwrap();

    let report = validate(&kb);
    assert_eq!(
        report.findings,
        vec![ValidationFinding::AsymmetricReference {
            from: EntityRef::Disease(DiseaseId::new("D1")),
            to: EntityRef::Symptom(SymptomId::new("S1")),
        }]
    );
}

#[test]
fn test_validator_finds_exactly_one_dangling_reference() {
    let kb = KnowledgeBase::load(
        vec![RawDiseaseRecord::new("D1", "moderate", "Test").with_symptoms(&["S1", "S9"])],
        vec![RawSymptomRecord::new("S1", "low", "Test").with_diseases(&["D1"])],
    )
    .unwrap();

    let report = validate(&kb);
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.findings[0],
        ValidationFinding::DanglingReference {
            from: EntityRef::Disease(DiseaseId::new("D1")),
            missing: "S9".to_string(),
        }
    );

    // A dangling symptom still scores for the disease that lists it
    let engine = MatchingEngine::new(&kb);
    let scores = engine.score(["S1"]).unwrap();
    assert_eq!(scores.scores["D1"].expected_count, 2);
}

#[test]
fn test_load_rejects_duplicates_and_bad_severity() {
    let duplicate = KnowledgeBase::load(
        vec![
            RawDiseaseRecord::new("Flu", "moderate", "Infection"),
            RawDiseaseRecord::new("Flu", "high", "Infection"),
        ],
        Vec::new(),
    );
    assert_eq!(
        duplicate.unwrap_err(),
        LoadError::DuplicateIdentifier {
            kind: CatalogKind::Disease,
            id: "Flu".to_string(),
        }
    );

    let bad = KnowledgeBase::load(
        Vec::new(),
        vec![RawSymptomRecord::new("Fever", "scorching", "General")],
    );
    assert!(matches!(
        bad,
        Err(LoadError::MissingField {
            field: "severity",
            ..
        })
    ));
}

fn section(name: &str, severity: &str, related: &[&str]) -> String {
    serde_json::json!({
        "version": "1.0.0",
        "section": name,
        "diseases": [],
        "symptoms": [{
            "id": "Fever",
            "severity": severity,
            "category": "General",
            "related_diseases": related,
        }],
    })
    .to_string()
}

#[test]
fn test_strict_merge_policy_rejects_cross_section_duplicates() {
    let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Strict);
    builder.add_section_json(&section("general", "low", &["Flu"])).unwrap();
    builder
        .add_section_json(&section("cardiology", "moderate", &["Myocarditis"]))
        .unwrap();

    assert!(matches!(
        builder.build(),
        Err(BuilderError::Load(LoadError::DuplicateIdentifier { .. }))
    ));
}

#[test]
fn test_union_merge_policy_combines_cross_section_duplicates() {
    let mut builder = KnowledgeBaseBuilder::new(MergePolicy::Union);
    builder.add_section_json(&section("general", "low", &["Flu"])).unwrap();
    builder
        .add_section_json(&section("cardiology", "moderate", &["Myocarditis"]))
        .unwrap();
    assert_eq!(builder.summary().merges.len(), 1);

    let kb = builder.build().unwrap();
    let fever = kb.symptom("Fever").unwrap();
    let related: Vec<&str> = fever.related_diseases.iter().map(DiseaseId::as_str).collect();
    assert_eq!(related, vec!["Flu", "Myocarditis"]);
    assert_eq!(fever.severity, Severity::Moderate);
    assert_eq!(fever.section.as_deref(), Some("general"));
}

#[test]
fn test_embedded_catalog_spans_both_sections() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let sections: BTreeSet<&str> = kb.sections();
    assert!(sections.contains("general"));
    assert!(sections.contains("cardiology"));
    assert_eq!(kb.disease("Pneumonia").unwrap().severity, Severity::High);
    assert_eq!(
        kb.disease("Myocarditis").unwrap().section.as_deref(),
        Some("cardiology")
    );
}

#[test]
fn test_catalog_file_round_trip() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.json");
    std::fs::write(&path, kb.to_json().unwrap()).unwrap();

    let reloaded = KnowledgeBase::load_from_file(&path).unwrap();
    assert_eq!(reloaded.disease_count(), kb.disease_count());
    assert_eq!(reloaded.symptom_count(), kb.symptom_count());
    assert_eq!(
        validate(&reloaded).findings,
        validate(&kb).findings
    );
}

#[test]
fn test_missing_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = KnowledgeBase::load_from_file(&dir.path().join("absent.json"));
    assert!(matches!(
        result,
        Err(CatalogError::Build(BuilderError::Io { .. }))
    ));
}

#[test]
fn test_session_explain_and_lookup() {
    let session =
        QuerySession::open_embedded(MatchingConfig::default(), ValidationPolicy::Warn).unwrap();

    let outcome = session
        .explain("Pneumonia", ["Fever", "Cough", "Shortness of Breath"])
        .unwrap();
    assert!((outcome.score.composite - 0.5).abs() < 1e-9);
    assert!(outcome.explanation.summary.contains("Pneumonia"));
    assert!(outcome.notices.is_empty());

    // Explicitly requested diseases are scored even without overlap
    let unrelated = session.explain("Eczema", ["Chest Pain"]).unwrap();
    assert_eq!(unrelated.score.matched_count, 0);

    assert!(matches!(
        session.explain("Dragon Pox", ["Fever"]),
        Err(QueryError::UnknownDisease(_))
    ));

    assert_eq!(
        session.lookup_symptom("Fever").map(|s| s.id),
        Some(SymptomId::new("Fever"))
    );
}

#[test]
fn test_custom_weights_change_the_balance() {
    let kb = KnowledgeBase::load_embedded().unwrap();
    let config = MatchingConfig {
        scoring_weights: dx_solver::matching::ScoringWeights {
            coverage: 0.0,
            recall: 1.0,
        },
        ..MatchingConfig::default()
    };
    let engine = MatchingEngine::with_config(&kb, config);
    let scores = engine.score(["Fever", "Cough", "Shortness of Breath"]).unwrap();

    // With all weight on recall, composite equals recall
    let pneumonia = &scores.scores["Pneumonia"];
    assert!((pneumonia.composite - 2.0 / 3.0).abs() < 1e-9);
}
