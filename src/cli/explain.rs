use clap::Args;

use crate::cli::{read_symptoms, CatalogSourceArgs, OutputFormat, ScoringArgs};
use crate::matching::engine::MatchingConfig;
use crate::session::{ExplainOutcome, DISCLAIMER};

#[derive(Args)]
pub struct ExplainArgs {
    /// Disease identifier
    #[arg(required = true)]
    pub disease: String,

    /// Reported symptoms. Use '-' to read one symptom per line from stdin
    #[arg(required = true, value_name = "SYMPTOM")]
    pub symptoms: Vec<String>,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    #[command(flatten)]
    pub source: CatalogSourceArgs,
}

/// Execute explain subcommand
///
/// # Errors
///
/// Returns an error if the knowledge base cannot be loaded, the disease is
/// unknown, or no reported symptom is known.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ExplainArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let symptoms = read_symptoms(&args.symptoms)?;
    let config = MatchingConfig {
        scoring_weights: args.scoring.weights(),
        ..MatchingConfig::default()
    };

    let session = args.source.open_session(config, verbose)?;
    let outcome = session.explain(&args.disease, &symptoms)?;

    for notice in &outcome.notices {
        eprintln!("Warning: {notice}");
    }

    match format {
        OutputFormat::Text => {
            print!("{}", outcome.explanation);
            println!("\n{DISCLAIMER}");
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "score": &outcome.score,
                "explanation": &outcome.explanation,
                "notices": &outcome.notices,
                "disclaimer": DISCLAIMER,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => print_tsv(&outcome),
    }

    Ok(())
}

fn print_tsv(outcome: &ExplainOutcome) {
    let score = &outcome.score;
    println!("symptom\tstatus");
    for s in &score.matched {
        println!("{s}\tmatched");
    }
    for s in &score.missing {
        println!("{s}\tnot_reported");
    }
    for s in &outcome.explanation.asymmetric_evidence {
        println!("{s}\tasymmetric");
    }
}
