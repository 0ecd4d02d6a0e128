use clap::Args;

use crate::catalog::validate::{validate, ValidationFinding};
use crate::cli::{CatalogSourceArgs, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Exit with an error if any finding is reported
    /// (`--strict-validation` has the same effect here)
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub source: CatalogSourceArgs,
}

/// Execute validate subcommand
///
/// # Errors
///
/// Returns an error if the knowledge base cannot be loaded, or under `--strict`
/// or `--strict-validation` if the report is not clean.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ValidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let strict = args.strict || args.source.strict_validation;
    let kb = args.source.load(verbose)?;
    let report = validate(&kb);

    match format {
        OutputFormat::Text => {
            if report.is_clean() {
                println!(
                    "Knowledge base is consistent ({} diseases, {} symptoms)",
                    kb.disease_count(),
                    kb.symptom_count()
                );
            } else {
                print!("{report}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Tsv => {
            println!("type\tsource_kind\tsource\ttarget");
            for finding in &report.findings {
                let kind = match finding {
                    ValidationFinding::AsymmetricReference { .. } => "asymmetric",
                    ValidationFinding::DanglingReference { .. } => "dangling",
                };
                println!(
                    "{kind}\t{}\t{}\t{}",
                    finding.source().kind(),
                    finding.source().id(),
                    finding.target_id()
                );
            }
        }
    }

    if strict && !report.is_clean() {
        anyhow::bail!(
            "Validation failed: {} findings ({} asymmetric, {} dangling)",
            report.len(),
            report.asymmetric().count(),
            report.dangling().count()
        );
    }

    Ok(())
}
