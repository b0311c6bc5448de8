//! Command-line interface for repmatch.
//!
//! Available commands:
//!
//! - **match**: Match every repertoire of a dataset against a reference sequence set
//! - **crosscheck**: Gene-aware brute-force matching with per-sequence hit lists
//! - **network**: Similarity-network features for every repertoire of a dataset
//!
//! ## Usage
//!
//! ```text
//! # Summaries of repertoire sequences matching known disease-associated receptors
//! repmatch match dataset.tsv references.tsv --max-edit-distance 1
//!
//! # Per-reference detail as JSON
//! repmatch --format json match dataset.tsv references.tsv --direction reference --detail
//!
//! # Network features as a table
//! repmatch --format tsv network dataset.tsv --extended --workers 8
//! ```
//!
//! A dataset is a tab-separated sheet with a `filename` column; see
//! [`parsing::sheet`](crate::parsing::sheet).

use clap::{Parser, Subcommand};

pub mod crosscheck;
pub mod matching;
pub mod network;

#[derive(Parser)]
#[command(name = "repmatch")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Approximate sequence matching and similarity networks for immune repertoires")]
#[command(
    long_about = "repmatch compares immune receptor repertoires against reference sequence sets.\n\nSequences match when their strings are within a small edit distance and their selected metadata (V gene, J gene, chain, ...) agree. It reports:\n- Per-repertoire counts of reads and unique sequences with a match\n- Optional per-sequence or per-reference match detail\n- Topological features of each repertoire's sequence similarity network"
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
    /// Match repertoires against reference sequences
    Match(matching::MatchArgs),

    /// Match on chain, V/J gene family and edit distance, listing every hit
    Crosscheck(crosscheck::CrosscheckArgs),

    /// Compute similarity-network features per repertoire
    Network(network::NetworkArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Render a repertoire label for text and TSV output
fn label_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Union of label names across repertoires, sorted
fn label_names<'a, I>(metadata: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a crate::core::RepertoireMetadata>,
{
    let mut names: Vec<String> = metadata
        .into_iter()
        .flat_map(|m| m.keys().cloned())
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["repmatch", "network", "d.tsv", "-v", "--format", "tsv"]);
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Tsv));
        assert!(matches!(cli.command, Commands::Network(_)));
    }

    #[test]
    fn test_label_helpers() {
        assert_eq!(label_value(&json!("CD")), "CD");
        assert_eq!(label_value(&json!(true)), "true");
        assert_eq!(label_value(&json!(3.5)), "3.5");

        let mut a = crate::core::RepertoireMetadata::new();
        a.insert("site".to_string(), json!("Oslo"));
        let mut b = crate::core::RepertoireMetadata::new();
        b.insert("age".to_string(), json!(3));
        b.insert("site".to_string(), json!("Bergen"));
        assert_eq!(label_names([&a, &b]), vec!["age", "site"]);
    }
}
