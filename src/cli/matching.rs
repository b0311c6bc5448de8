use std::path::PathBuf;

use clap::Args;

use crate::cli::{label_names, label_value, OutputFormat};
use crate::core::MetadataAttribute;
use crate::matching::{
    DatasetMatchResult, DatasetMatcher, MatchDirection, MatchingConfig, SummaryType,
};
use crate::parsing::sheet::parse_dataset_sheet;
use crate::parsing::tsv::parse_sequences_file;

#[derive(Args)]
pub struct MatchArgs {
    /// Dataset sheet (TSV with a `filename` column)
    #[arg(required = true)]
    pub dataset: PathBuf,

    /// Reference sequences (TSV, optionally gzipped)
    #[arg(required = true)]
    pub references: PathBuf,

    /// Side the match detail is reported from
    #[arg(long, value_enum, default_value_t = MatchDirection::QueryToReference)]
    pub direction: MatchDirection,

    /// Maximum edit distance between matching sequences
    #[arg(long)]
    pub max_edit_distance: Option<u32>,

    /// Only sequences of equal length match
    #[arg(long)]
    pub same_length: bool,

    /// Comma-separated metadata attributes that must agree (e.g. v_gene,j_gene,chain)
    #[arg(long)]
    pub attributes: Option<String>,

    /// Number of worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Report per-sequence match lists (JSON output)
    #[arg(long)]
    pub detail: bool,

    /// JSON matching configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl MatchArgs {
    fn matching_config(&self) -> anyhow::Result<MatchingConfig> {
        let mut config = match &self.config {
            Some(path) => MatchingConfig::load_from_file(path)?,
            None => MatchingConfig::default(),
        };
        if let Some(distance) = self.max_edit_distance {
            config = config.with_max_edit_distance(distance);
        }
        if self.same_length {
            config = config.with_same_length_required(true);
        }
        if let Some(attributes) = &self.attributes {
            config = config.with_metadata_attributes(MetadataAttribute::parse_list(attributes));
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.detail {
            config = config.with_detail(true);
        }
        Ok(config)
    }
}

pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.matching_config()?;
    let matcher = DatasetMatcher::new(config)?;

    let dataset = parse_dataset_sheet(&args.dataset)?;
    if dataset.is_empty() {
        anyhow::bail!("Dataset sheet {} lists no repertoires", args.dataset.display());
    }
    let references = parse_sequences_file(&args.references)?;

    if verbose {
        eprintln!(
            "Matching {} repertoires against {} reference sequences (max edit distance {}, {} workers)",
            dataset.len(),
            references.len(),
            matcher.config().max_edit_distance,
            matcher.config().workers,
        );
    }

    let result = matcher.match_dataset(&dataset, references, args.direction)?;

    match format {
        OutputFormat::Text => print_text_results(&result, matcher.config()),
        OutputFormat::Json => print_json_results(&result, matcher.config())?,
        OutputFormat::Tsv => print_tsv_results(&result),
    }

    Ok(())
}

fn print_text_results(result: &DatasetMatchResult, config: &MatchingConfig) {
    println!("Match Results");
    println!("{}", "=".repeat(60));
    println!("Direction: {}", result.direction);
    println!("Max edit distance: {}", config.max_edit_distance);
    let attributes: Vec<&str> = config.metadata_attributes.iter().map(MetadataAttribute::name).collect();
    println!("Attributes: {}", attributes.join(", "));
    println!("Reference sequences: {}", result.reference_sequences.len());

    for repertoire in &result.repertoires {
        println!("\n#{} {}", repertoire.index + 1, repertoire.identifier);
        for (name, value) in &repertoire.metadata {
            println!("  {name}: {}", label_value(value));
        }
        println!(
            "  Reads with match: {} / {} ({:.2}%)",
            repertoire.total_reads_with_match,
            repertoire.total_reads,
            repertoire.pct_total_reads_with_match * 100.0
        );
        println!(
            "  Unique sequences with match: {} / {} ({:.2}%)",
            repertoire.unique_reads_with_match,
            repertoire.unique_reads,
            repertoire.pct_unique_reads_with_match * 100.0
        );
    }
}

fn print_json_results(result: &DatasetMatchResult, config: &MatchingConfig) -> anyhow::Result<()> {
    let mut output = serde_json::json!({
        "created_at": chrono::Utc::now().to_rfc3339(),
        "direction": result.direction,
        "config": config,
        "reference_count": result.reference_sequences.len(),
        "repertoires": result.repertoires,
    });

    if config.include_detail && result.direction == MatchDirection::ReferenceToQuery {
        let names = result.reference_feature_names(&config.metadata_attributes, config.sequence_type)?;
        let values: Vec<serde_json::Value> = result
            .repertoires
            .iter()
            .map(|repertoire| {
                SummaryType::ALL
                    .iter()
                    .map(|summary| {
                        (
                            summary.name().to_string(),
                            serde_json::json!(repertoire.reference_feature_values(*summary)),
                        )
                    })
                    .collect::<serde_json::Map<_, _>>()
                    .into()
            })
            .collect();
        output["reference_features"] = serde_json::json!({
            "names": names,
            "values": values,
        });
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(result: &DatasetMatchResult) {
    let labels = label_names(result.repertoires.iter().map(|r| &r.metadata));

    let mut header = vec!["identifier".to_string()];
    header.extend(labels.iter().cloned());
    header.extend(
        ["total_reads", "unique_reads"]
            .iter()
            .map(ToString::to_string)
            .chain(SummaryType::ALL.iter().map(ToString::to_string)),
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
        row.push(repertoire.total_reads.to_string());
        row.push(repertoire.unique_reads.to_string());
        row.push(repertoire.total_reads_with_match.to_string());
        row.push(format!("{:.4}", repertoire.pct_total_reads_with_match));
        row.push(repertoire.unique_reads_with_match.to_string());
        row.push(format!("{:.4}", repertoire.pct_unique_reads_with_match));
        println!("{}", row.join("\t"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> MatchArgs {
        let mut argv = vec!["repmatch", "match", "d.tsv", "r.tsv"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Match(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.direction, MatchDirection::QueryToReference);
        assert_eq!(args.matching_config().unwrap(), MatchingConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_edit_distance": 2, "workers": 2}"#).unwrap();

        let args = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--workers",
            "6",
            "--attributes",
            "v_gene,chain",
            "--direction",
            "reference",
            "--detail",
        ]);
        let config = args.matching_config().unwrap();
        assert_eq!(config.max_edit_distance, 2);
        assert_eq!(config.workers, 6);
        assert_eq!(
            config.metadata_attributes,
            vec![MetadataAttribute::VGene, MetadataAttribute::Chain]
        );
        assert!(config.include_detail);
        assert_eq!(args.direction, MatchDirection::ReferenceToQuery);
    }
}
