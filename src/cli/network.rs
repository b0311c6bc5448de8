use std::path::PathBuf;

use clap::Args;

use crate::cli::{label_names, label_value, OutputFormat};
use crate::network::{encode_dataset, FeatureSet, NetworkConfig, RepertoireNetworkFeatures};
use crate::parsing::sheet::parse_dataset_sheet;

#[derive(Args)]
pub struct NetworkArgs {
    /// Dataset sheet (TSV with a `filename` column)
    #[arg(required = true)]
    pub dataset: PathBuf,

    /// Maximum edit distance joining two sequences
    #[arg(long)]
    pub max_edit_distance: Option<u32>,

    /// Add diameter, betweenness and closeness features
    #[arg(long)]
    pub extended: bool,

    /// Number of worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// JSON network configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl NetworkArgs {
    fn network_config(&self) -> anyhow::Result<NetworkConfig> {
        let mut config = match &self.config {
            Some(path) => NetworkConfig::load_from_file(path)?,
            None => NetworkConfig::default(),
        };
        if let Some(distance) = self.max_edit_distance {
            config = config.with_max_edit_distance(distance);
        }
        if self.extended {
            config = config.with_feature_set(FeatureSet::Extended);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        Ok(config)
    }
}

pub fn run(args: NetworkArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.network_config()?;
    let dataset = parse_dataset_sheet(&args.dataset)?;

    if verbose {
        eprintln!(
            "Encoding {} repertoires ({} features, max edit distance {})",
            dataset.len(),
            config.feature_set.len(),
            config.max_edit_distance
        );
    }

    let encoded = encode_dataset(&dataset, &config)?;

    match format {
        OutputFormat::Text => print_text_results(&encoded),
        OutputFormat::Json => print_json_results(&encoded, &config)?,
        OutputFormat::Tsv => print_tsv_results(&encoded, config.feature_set),
    }

    Ok(())
}

fn print_text_results(encoded: &[RepertoireNetworkFeatures]) {
    println!("Network Features");
    println!("{}", "=".repeat(60));

    for repertoire in encoded {
        println!(
            "\n#{} {} ({} vertices, {} edges)",
            repertoire.index + 1,
            repertoire.identifier,
            repertoire.vertices,
            repertoire.edges
        );
        for (name, value) in repertoire.features.iter() {
            println!("  {name:<24} {value:.6}");
        }
    }
}

fn print_json_results(
    encoded: &[RepertoireNetworkFeatures],
    config: &NetworkConfig,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "created_at": chrono::Utc::now().to_rfc3339(),
        "config": config,
        "feature_names": config.feature_set.feature_names(),
        "repertoires": encoded,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(encoded: &[RepertoireNetworkFeatures], feature_set: FeatureSet) {
    let labels = label_names(encoded.iter().map(|r| &r.metadata));

    let mut header = vec!["identifier".to_string()];
    header.extend(labels.iter().cloned());
    header.extend(feature_set.feature_names());
    println!("{}", header.join("\t"));

    for repertoire in encoded {
        let mut row = vec![repertoire.identifier.clone()];
        row.extend(labels.iter().map(|name| {
            repertoire
                .metadata
                .get(name)
                .map(label_value)
                .unwrap_or_default()
        }));
        row.extend(repertoire.features.values.iter().map(|v| format!("{v:.6}")));
        println!("{}", row.join("\t"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_extended_flag_selects_feature_set() {
        let cli = Cli::parse_from(["repmatch", "network", "d.tsv", "--extended", "--workers", "2"]);
        let Commands::Network(args) = cli.command else {
            unreachable!()
        };
        let config = args.network_config().unwrap();
        assert_eq!(config.feature_set, FeatureSet::Extended);
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_edit_distance, 1);
    }
}
