use std::path::PathBuf;

use clap::Args;

use crate::cli::{label_names, label_value, OutputFormat};
use crate::matching::config::{DEFAULT_MAX_EDIT_DISTANCE, DEFAULT_WORKERS};
use crate::matching::{CrossCheckResult, GeneMatcher};
use crate::parsing::sheet::parse_dataset_sheet;
use crate::parsing::tsv::parse_sequences_file;

#[derive(Args)]
pub struct CrosscheckArgs {
    /// Dataset sheet (TSV with a `filename` column)
    #[arg(required = true)]
    pub dataset: PathBuf,

    /// Reference sequences (TSV, optionally gzipped)
    #[arg(required = true)]
    pub references: PathBuf,

    /// Maximum edit distance between matching sequences
    #[arg(long, default_value_t = DEFAULT_MAX_EDIT_DISTANCE)]
    pub max_distance: u32,

    /// Number of worker threads
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
}

pub fn run(args: CrosscheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let matcher = GeneMatcher::new(args.max_distance, args.workers)?;
    let dataset = parse_dataset_sheet(&args.dataset)?;
    let references = parse_sequences_file(&args.references)?;

    if verbose {
        eprintln!(
            "Cross-checking {} repertoires against {} reference sequences",
            dataset.len(),
            references.len()
        );
    }

    let result = matcher.match_dataset(&dataset, &references)?;

    match format {
        OutputFormat::Text => print_text_results(&result),
        OutputFormat::Json => print_json_results(&result)?,
        OutputFormat::Tsv => print_tsv_results(&result),
    }

    Ok(())
}

fn print_text_results(result: &CrossCheckResult) {
    println!("Cross-check Results");
    println!("{}", "=".repeat(60));

    for repertoire in &result.repertoires {
        println!("\n#{} {}", repertoire.index + 1, repertoire.identifier);
        println!(
            "  Sequences matched: {} / {} ({:.2}%)",
            repertoire.sequences_matched,
            repertoire.sequences.len(),
            repertoire.percentage_of_sequences_matched * 100.0
        );
        for sequence in repertoire.sequences.iter().filter(|s| !s.matching_sequences.is_empty()) {
            println!(
                "  {} [{} {}] -> {}",
                sequence.sequence,
                sequence.v_gene.as_deref().unwrap_or("-"),
                sequence.j_gene.as_deref().unwrap_or("-"),
                sequence.matching_sequences.join(", ")
            );
        }
    }
}

fn print_json_results(result: &CrossCheckResult) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "created_at": chrono::Utc::now().to_rfc3339(),
        "repertoires": result.repertoires,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(result: &CrossCheckResult) {
    let labels = label_names(result.repertoires.iter().map(|r| &r.metadata));

    let mut header = vec!["identifier".to_string()];
    header.extend(labels.iter().cloned());
    header.extend(
        ["sequences", "sequences_matched", "percentage_of_sequences_matched"]
            .iter()
            .map(ToString::to_string),
    );
    println!("{}", header.join("\t"));

    for repertoire in &result.repertoires {
        let mut row = vec![repertoire.identifier.clone()];
        row.extend(labels.iter().map(|name| {
            repertoire
                .metadata
                .get(name)
                .map(label_value)
                .unwrap_or_default()
        }));
        row.push(repertoire.sequences.len().to_string());
        row.push(repertoire.sequences_matched.to_string());
        row.push(format!("{:.4}", repertoire.percentage_of_sequences_matched));
        println!("{}", row.join("\t"));
    }
}
