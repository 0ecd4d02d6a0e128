//! Command-line interface for dx-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **query**: Rank candidate diseases for a list of reported symptoms
//! - **explain**: Show how one disease scores against reported symptoms
//! - **validate**: Report cross-reference problems in the knowledge base
//! - **catalog**: List, show, or export catalog records
//!
//! ## Usage
//!
//! ```text
//! # Rank diseases for three symptoms
//! dx-solver query Fever Cough "Shortness of Breath"
//!
//! # Read symptoms from stdin, one per line
//! printf 'Fever\nCough\n' | dx-solver query -
//!
//! # JSON output for scripting
//! dx-solver query Fever Cough --format json
//!
//! # Why does Pneumonia score the way it does?
//! dx-solver explain Pneumonia Fever Cough
//!
//! # Use custom catalog sections instead of the embedded ones
//! dx-solver query Fever --catalog general.json --catalog extra.json
//! ```

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::catalog::builder::{KnowledgeBaseBuilder, MergePolicy};
use crate::catalog::store::KnowledgeBase;
use crate::catalog::validate::ValidationPolicy;
use crate::matching::engine::MatchingConfig;
use crate::matching::scoring::ScoringWeights;
use crate::session::QuerySession;

pub mod catalog;
pub mod explain;
pub mod query;
pub mod validate;

#[derive(Parser)]
#[command(name = "dx-solver")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Rank candidate diseases from reported symptoms")]
#[command(
    long_about = "dx-solver ranks the diseases of a medical knowledge base by how well they account for a set of reported symptoms.\n\nIt scores every disease on:\n- Coverage: how much of the disease's symptom profile was reported\n- Recall: how much of the complaint the disease explains\n\nResults are a ranking of catalog entries, not a diagnosis."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank candidate diseases for the reported symptoms
    Query(query::QueryArgs),

    /// Explain one disease's score against the reported symptoms
    Explain(explain::ExplainArgs),

    /// Check the knowledge base for one-sided or dangling cross-references
    Validate(validate::ValidateArgs),

    /// Inspect the knowledge base
    Catalog(catalog::CatalogArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where the knowledge base comes from
#[derive(Args, Debug, Clone)]
pub struct CatalogSourceArgs {
    /// Catalog section file (repeatable, merged in order). Defaults to the embedded catalog
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalogs: Vec<PathBuf>,

    /// How records defined in more than one section are combined
    #[arg(long, value_enum, default_value = "union")]
    pub merge_policy: MergePolicy,

    /// Refuse to run if the knowledge base has any cross-reference finding
    #[arg(long)]
    pub strict_validation: bool,
}

impl CatalogSourceArgs {
    pub fn validation_policy(&self) -> ValidationPolicy {
        if self.strict_validation {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Warn
        }
    }

    /// Load the embedded catalog, or the given section files
    ///
    /// # Errors
    ///
    /// Returns an error if a section cannot be read, parsed or loaded.
    pub fn load(&self, verbose: bool) -> anyhow::Result<KnowledgeBase> {
        let kb = if self.catalogs.is_empty() {
            KnowledgeBase::load_embedded()?
        } else {
            let mut builder = KnowledgeBaseBuilder::new(self.merge_policy);
            for path in &self.catalogs {
                builder.add_section_file(path)?;
            }
            if verbose {
                eprintln!("{}", builder.summary());
            }
            builder.build()?
        };

        if verbose {
            eprintln!(
                "Loaded knowledge base with {} diseases and {} symptoms",
                kb.disease_count(),
                kb.symptom_count()
            );
        }

        Ok(kb)
    }

    /// Load the knowledge base and open a session over it
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or strict validation rejects the knowledge base.
    pub fn open_session(&self, config: MatchingConfig, verbose: bool) -> anyhow::Result<QuerySession> {
        let kb = self.load(verbose)?;
        let session = QuerySession::open(kb, config, self.validation_policy())?;

        if verbose {
            let report = session.report();
            if !report.is_clean() {
                eprintln!(
                    "Knowledge base has {} cross-reference findings (run `dx-solver validate` for details)",
                    report.len()
                );
            }
        }

        Ok(session)
    }
}

/// Relative weights of the two scoring components
#[derive(Args, Debug, Clone)]
pub struct ScoringArgs {
    /// Weight for coverage (0-100, default 50)
    /// How much of the disease's symptom profile was reported
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub weight_coverage: u32,

    /// Weight for recall (0-100, default 50)
    /// How much of the complaint the disease explains
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub weight_recall: u32,
}

impl ScoringArgs {
    pub fn weights(&self) -> ScoringWeights {
        ScoringWeights {
            coverage: f64::from(self.weight_coverage) / 100.0,
            recall: f64::from(self.weight_recall) / 100.0,
        }
    }
}

/// Expand a symptom argument list; a lone `-` reads one symptom per line from stdin
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub fn read_symptoms(args: &[String]) -> anyhow::Result<Vec<String>> {
    if args.len() == 1 && args[0] == "-" {
        let mut symptoms = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                symptoms.push(trimmed.to_string());
            }
        }
        return Ok(symptoms);
    }
    Ok(args.to_vec())
}

/// Truncate `s` to at most `max_len` characters, marking the cut with "..."
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_query() {
        let cli = Cli::try_parse_from([
            "dx-solver",
            "query",
            "Fever",
            "Cough",
            "--catalog",
            "a.json",
            "--catalog",
            "b.json",
            "--merge-policy",
            "strict",
            "-f",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.format, OutputFormat::Json));
        let Commands::Query(args) = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.symptoms, vec!["Fever", "Cough"]);
        assert_eq!(args.source.catalogs.len(), 2);
        assert_eq!(args.source.merge_policy, MergePolicy::Strict);
    }

    #[test]
    fn test_weight_range_is_enforced() {
        let result = Cli::try_parse_from(["dx-solver", "query", "Fever", "--weight-recall", "150"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_min_score_range_is_enforced() {
        for bad in ["NaN", "1.5", "-0.1", "inf", "high"] {
            let result = Cli::try_parse_from(["dx-solver", "query", "Fever", "--min-score", bad]);
            assert!(result.is_err(), "--min-score {bad} should be rejected");
        }

        let cli = Cli::try_parse_from(["dx-solver", "query", "Fever", "--min-score", "0.5"]).unwrap();
        let Commands::Query(args) = cli.command else {
            panic!("expected query command");
        };
        assert!((args.min_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scoring_args_weights() {
        let args = ScoringArgs {
            weight_coverage: 25,
            weight_recall: 75,
        };
        let w = args.weights().normalized();
        assert!((w.coverage - 0.25).abs() < 1e-12);
        assert!((w.recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Pneumonia", 20), "Pneumonia");
        assert_eq!(truncate("Chronic Kidney Disease", 10), "Chronic...");
    }
}
