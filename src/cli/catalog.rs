use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::catalog::store::KnowledgeBase;
use crate::cli::{truncate, CatalogSourceArgs, OutputFormat};
use crate::core::record::{DiseaseRecord, LocalizedText, SymptomRecord};

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List the records of one catalog
    List {
        /// Which catalog to list
        #[arg(long, value_enum, default_value = "diseases")]
        kind: ListKind,

        /// Filter by section (e.g., "cardiology")
        #[arg(long)]
        section: Option<String>,

        /// Filter by category (e.g., "Respiratory")
        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        source: CatalogSourceArgs,
    },

    /// Show details of a disease or symptom
    Show {
        /// Disease or symptom identifier
        #[arg(required = true)]
        id: String,

        #[command(flatten)]
        source: CatalogSourceArgs,
    },

    /// Export the merged knowledge base as a single section file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        #[command(flatten)]
        source: CatalogSourceArgs,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ListKind {
    Diseases,
    Symptoms,
}

/// One listing row, common to both catalogs
struct Row<'a> {
    id: &'a str,
    severity: String,
    category: &'a str,
    section: &'a str,
    related: usize,
}

impl<'a> From<&'a DiseaseRecord> for Row<'a> {
    fn from(d: &'a DiseaseRecord) -> Self {
        Self {
            id: d.id.as_str(),
            severity: d.severity.to_string(),
            category: &d.category,
            section: d.section.as_deref().unwrap_or("-"),
            related: d.related_symptoms.len(),
        }
    }
}

impl<'a> From<&'a SymptomRecord> for Row<'a> {
    fn from(s: &'a SymptomRecord) -> Self {
        Self {
            id: s.id.as_str(),
            severity: s.severity.to_string(),
            category: &s.category,
            section: s.section.as_deref().unwrap_or("-"),
            related: s.related_diseases.len(),
        }
    }
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the knowledge base cannot be loaded, a record is not
/// found, or the export cannot be written.
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List {
            kind,
            section,
            category,
            source,
        } => run_list(
            &source,
            kind,
            section.as_deref(),
            category.as_deref(),
            format,
            verbose,
        ),
        CatalogCommands::Show { id, source } => run_show(&id, &source, format, verbose),
        CatalogCommands::Export { output, source } => run_export(&output, &source, verbose),
    }
}

fn run_list(
    source: &CatalogSourceArgs,
    kind: ListKind,
    section_filter: Option<&str>,
    category_filter: Option<&str>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let kb = source.load(verbose)?;

    let rows: Vec<Row<'_>> = match kind {
        ListKind::Diseases => kb.diseases().map(Row::from).collect(),
        ListKind::Symptoms => kb.symptoms().map(Row::from).collect(),
    };

    // Filter rows
    let filtered: Vec<&Row<'_>> = rows
        .iter()
        .filter(|r| {
            if let Some(section) = section_filter {
                if !r.section.eq_ignore_ascii_case(section) {
                    return false;
                }
            }
            if let Some(category) = category_filter {
                if !r.category.to_lowercase().contains(&category.to_lowercase()) {
                    return false;
                }
            }
            true
        })
        .collect();

    let (title, related_label) = match kind {
        ListKind::Diseases => ("Diseases", "Symptoms"),
        ListKind::Symptoms => ("Symptoms", "Diseases"),
    };

    match format {
        OutputFormat::Text => {
            // Calculate column widths dynamically
            let id_width = filtered
                .iter()
                .map(|r| r.id.chars().count().min(40))
                .max()
                .unwrap_or(2)
                .max(2);
            let category_width = filtered
                .iter()
                .map(|r| r.category.chars().count().min(25))
                .max()
                .unwrap_or(8)
                .max(8);
            let section_width = filtered
                .iter()
                .map(|r| r.section.len())
                .max()
                .unwrap_or(7)
                .max(7);

            let total_width = id_width + category_width + section_width + 8 + 8 + 4;

            println!("{title} ({} records)\n", filtered.len());
            println!(
                "{:<id_w$} {:<8} {:<cat_w$} {:<sec_w$} {:>8}",
                "ID",
                "Severity",
                "Category",
                "Section",
                related_label,
                id_w = id_width,
                cat_w = category_width,
                sec_w = section_width
            );
            println!("{}", "-".repeat(total_width));

            for r in &filtered {
                println!(
                    "{:<id_w$} {:<8} {:<cat_w$} {:<sec_w$} {:>8}",
                    truncate(r.id, id_width),
                    r.severity,
                    truncate(r.category, category_width),
                    r.section,
                    r.related,
                    id_w = id_width,
                    cat_w = category_width,
                    sec_w = section_width
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = filtered
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id,
                        "severity": r.severity,
                        "category": r.category,
                        "section": r.section,
                        "related_count": r.related,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("id\tseverity\tcategory\tsection\trelated_count");
            for r in &filtered {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    r.id, r.severity, r.category, r.section, r.related
                );
            }
        }
    }

    Ok(())
}

fn run_show(
    id: &str,
    source: &CatalogSourceArgs,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let kb = source.load(verbose)?;

    // The same name may exist in both catalogs
    let disease = kb.disease(id);
    let symptom = kb.symptom(id);
    if disease.is_none() && symptom.is_none() {
        anyhow::bail!("'{id}' is not a disease or symptom in the catalog");
    }

    match format {
        OutputFormat::Text => {
            if let Some(d) = disease {
                print_disease(d, &kb);
            }
            if let Some(s) = symptom {
                if disease.is_some() {
                    println!();
                }
                print_symptom(s, &kb);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "disease": disease,
                "symptom": symptom,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("kind\tid\tseverity\tcategory\trelated");
            if let Some(d) = disease {
                let related: Vec<&str> = d.related_symptoms.iter().map(|s| s.as_str()).collect();
                println!(
                    "disease\t{}\t{}\t{}\t{}",
                    d.id,
                    d.severity,
                    d.category,
                    related.join(",")
                );
            }
            if let Some(s) = symptom {
                let related: Vec<&str> = s.related_diseases.iter().map(|d| d.as_str()).collect();
                println!(
                    "symptom\t{}\t{}\t{}\t{}",
                    s.id,
                    s.severity,
                    s.category,
                    related.join(",")
                );
            }
        }
    }

    Ok(())
}

fn print_header(kind: &str, id: &str, name_secondary: Option<&str>) {
    match name_secondary {
        Some(name) => println!("{kind}: {id} ({name})\n"),
        None => println!("{kind}: {id}\n"),
    }
}

fn print_description(description: &LocalizedText) {
    if let Some(text) = &description.primary {
        println!("\nDescription: {text}");
    }
    if let Some(text) = &description.secondary {
        println!("             {text}");
    }
}

fn print_disease(d: &DiseaseRecord, kb: &KnowledgeBase) {
    print_header("Disease", d.id.as_str(), d.name_secondary.as_deref());
    println!("Severity: {}", d.severity);
    println!("Category: {}", d.category);
    println!("Section:  {}", d.section.as_deref().unwrap_or("-"));
    print_description(&d.description);

    println!("\nRelated symptoms ({}):", d.related_symptoms.len());
    for s in &d.related_symptoms {
        let note = if kb.symptom(s.as_str()).is_none() {
            " (no symptom record)"
        } else {
            ""
        };
        println!("  - {s}{note}");
    }
}

fn print_symptom(s: &SymptomRecord, kb: &KnowledgeBase) {
    print_header("Symptom", s.id.as_str(), s.name_secondary.as_deref());
    println!("Severity: {}", s.severity);
    println!("Category: {}", s.category);
    println!("Section:  {}", s.section.as_deref().unwrap_or("-"));
    print_description(&s.description);

    println!("\nRelated diseases ({}):", s.related_diseases.len());
    for d in &s.related_diseases {
        let note = if kb.disease(d.as_str()).is_none() {
            " (no disease record)"
        } else {
            ""
        };
        println!("  - {d}{note}");
    }
}

fn run_export(output: &Path, source: &CatalogSourceArgs, verbose: bool) -> anyhow::Result<()> {
    let kb = source.load(verbose)?;

    let json = kb.to_json()?;
    std::fs::write(output, json)?;

    println!(
        "Exported {} diseases and {} symptoms to {}",
        kb.disease_count(),
        kb.symptom_count(),
        output.display()
    );

    Ok(())
}
