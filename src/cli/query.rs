use std::collections::BTreeSet;

use clap::Args;

use crate::cli::{read_symptoms, CatalogSourceArgs, OutputFormat, ScoringArgs};
use crate::core::types::SymptomId;
use crate::matching::engine::MatchingConfig;
use crate::matching::ranking::RankedCandidate;
use crate::session::{QueryOutcome, DISCLAIMER};

#[derive(Args)]
pub struct QueryArgs {
    /// Reported symptoms, as exact catalog identifiers.
    /// Use '-' to read one symptom per line from stdin
    #[arg(required = true, value_name = "SYMPTOM")]
    pub symptoms: Vec<String>,

    /// Number of candidates to show (0 shows all)
    #[arg(short = 'n', long, default_value = "10")]
    pub max_results: usize,

    /// Only rank diseases from this catalog section (repeatable)
    #[arg(long = "section", value_name = "SECTION")]
    pub sections: Vec<String>,

    /// Drop candidates scoring at or below this composite score (0.0-1.0)
    #[arg(long, default_value = "0.0", value_parser = parse_min_score)]
    pub min_score: f64,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    #[command(flatten)]
    pub source: CatalogSourceArgs,
}

/// Execute query subcommand
///
/// # Errors
///
/// Returns an error if the knowledge base cannot be loaded or the query has no
/// known symptoms.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: QueryArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let symptoms = read_symptoms(&args.symptoms)?;

    let config = MatchingConfig {
        min_score: args.min_score,
        scoring_weights: args.scoring.weights(),
        sections: if args.sections.is_empty() {
            None
        } else {
            Some(args.sections.iter().cloned().collect())
        },
    };

    if verbose {
        let norm = config.scoring_weights.normalized();
        eprintln!(
            "Scoring weights: {:.0}% coverage, {:.0}% recall",
            norm.coverage * 100.0,
            norm.recall * 100.0,
        );
    }

    let session = args.source.open_session(config, verbose)?;
    let outcome = session.query(&symptoms, Some(args.max_results))?;

    for notice in outcome.notices() {
        eprintln!("Warning: {notice}");
    }

    if outcome.candidates().is_empty() && !matches!(format, OutputFormat::Text) {
        eprintln!("No matching diseases found.");
    }

    match format {
        OutputFormat::Text => print_text_results(&outcome),
        OutputFormat::Json => print_json_results(&outcome)?,
        OutputFormat::Tsv => print_tsv_results(&outcome),
    }

    Ok(())
}

/// Parse a minimum composite score, which must be a finite value in `[0, 1]`
fn parse_min_score(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{s} is not in 0.0..=1.0"))
    }
}

fn join(ids: &BTreeSet<SymptomId>) -> String {
    ids.iter().map(SymptomId::as_str).collect::<Vec<_>>().join(", ")
}

fn print_text_results(outcome: &QueryOutcome) {
    let reported = &outcome.scores().reported;
    println!("Reported symptoms ({}): {}", reported.len(), join(reported));

    if outcome.candidates().is_empty() {
        println!("\nNo matching diseases found.");
    }

    for (i, candidate) in outcome.candidates().iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }
        print_candidate(&candidate);
    }

    println!("\n{DISCLAIMER}");
}

fn print_candidate(candidate: &RankedCandidate) {
    println!(
        "\n#{} {} ({})",
        candidate.rank,
        candidate.disease,
        candidate.confidence.label()
    );
    println!(
        "   Score: {:.1}% (coverage {:.1}%, recall {:.1}%)",
        candidate.composite * 100.0,
        candidate.coverage * 100.0,
        candidate.recall * 100.0,
    );
    println!("   Severity: {}", candidate.severity);
    println!("   Matched: {}", join(&candidate.matched));
    if !candidate.missing.is_empty() {
        println!("   Not reported: {}", join(&candidate.missing));
    }
}

fn print_json_results(outcome: &QueryOutcome) -> anyhow::Result<()> {
    let candidates: Vec<RankedCandidate> = outcome.candidates().iter().collect();
    let output = serde_json::json!({
        "reported": &outcome.scores().reported,
        "notices": outcome.notices(),
        "candidates": candidates,
        "disclaimer": DISCLAIMER,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(outcome: &QueryOutcome) {
    println!("rank\tdisease\tcomposite\tcoverage\trecall\tseverity\tconfidence\tmatched\tmissing");
    for c in outcome.candidates().iter() {
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{}\t{}\t{}\t{}",
            c.rank,
            c.disease,
            c.composite,
            c.coverage,
            c.recall,
            c.severity,
            c.confidence.label(),
            c.matched.iter().map(SymptomId::as_str).collect::<Vec<_>>().join(","),
            c.missing.iter().map(SymptomId::as_str).collect::<Vec<_>>().join(","),
        );
    }
}
