use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::core::{Repertoire, RepertoireDataset, RepertoireMetadata, SequenceType};
use crate::network::features::{compute_features, FeatureSet, NetworkFeatures};
use crate::network::graph::SimilarityGraph;
use crate::network::NetworkError;
use crate::utils::validation::{validate_max_edit_distance, validate_workers};

/// Parameters of dataset-level network encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub sequence_type: SequenceType,
    pub max_edit_distance: u32,
    pub feature_set: FeatureSet,
    pub workers: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            sequence_type: SequenceType::AminoAcid,
            max_edit_distance: 1,
            feature_set: FeatureSet::Standard,
            workers: 4,
        }
    }
}

impl NetworkConfig {
    /// # Errors
    ///
    /// Returns `NetworkError::Json` for malformed JSON, `NetworkError::Config` if
    /// validation fails.
    pub fn from_json(json: &str) -> Result<Self, NetworkError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `NetworkError::Io` if the file cannot be read, otherwise as [`Self::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, NetworkError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// # Errors
    ///
    /// Returns `NetworkError::Config` for zero workers or an unsupported edit distance.
    pub fn validate(&self) -> Result<(), NetworkError> {
        validate_max_edit_distance(self.max_edit_distance)?;
        validate_workers(self.workers)?;
        Ok(())
    }

    #[must_use]
    pub fn with_max_edit_distance(mut self, max_edit_distance: u32) -> Self {
        self.max_edit_distance = max_edit_distance;
        self
    }

    #[must_use]
    pub fn with_feature_set(mut self, feature_set: FeatureSet) -> Self {
        self.feature_set = feature_set;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_sequence_type(mut self, sequence_type: SequenceType) -> Self {
        self.sequence_type = sequence_type;
        self
    }
}

/// Network features of one repertoire
#[derive(Debug, Clone, Serialize)]
pub struct RepertoireNetworkFeatures {
    pub identifier: String,
    pub index: usize,
    pub metadata: RepertoireMetadata,
    pub vertices: usize,
    pub edges: usize,
    pub features: NetworkFeatures,
}

/// Build the similarity graph of one repertoire's in-frame sequences and compute its
/// features
///
/// # Errors
///
/// Fails if the repertoire cannot be loaded or an in-frame sequence lacks the
/// configured sequence type.
pub fn encode_repertoire<R: Repertoire + ?Sized>(
    index: usize,
    repertoire: &R,
    config: &NetworkConfig,
) -> Result<RepertoireNetworkFeatures, NetworkError> {
    let start = Instant::now();
    let sequences = repertoire.load_sequences()?;

    let strings = sequences
        .iter()
        .filter(|s| s.is_in_frame())
        .map(|s| s.sequence(config.sequence_type))
        .collect::<Result<Vec<_>, _>>()?;
    let graph = SimilarityGraph::construct(strings, config.max_edit_distance)?;
    drop(sequences);

    let features = compute_features(&graph, config.feature_set);
    debug!(
        repertoire = repertoire.identifier(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        elapsed_ms = start.elapsed().as_millis(),
        "Encoded repertoire network"
    );

    Ok(RepertoireNetworkFeatures {
        identifier: repertoire.identifier().to_string(),
        index,
        metadata: repertoire.metadata().clone(),
        vertices: graph.vertex_count(),
        edges: graph.edge_count(),
        features,
    })
}

/// Encode every repertoire of a dataset on a bounded worker pool, in input order
///
/// # Errors
///
/// Fails if the configuration is invalid, the pool cannot be built, or any
/// repertoire fails.
pub fn encode_dataset<R: Repertoire>(
    dataset: &RepertoireDataset<R>,
    config: &NetworkConfig,
) -> Result<Vec<RepertoireNetworkFeatures>, NetworkError> {
    config.validate()?;
    let start = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;
    let encoded = pool.install(|| {
        dataset
            .repertoires()
            .par_iter()
            .enumerate()
            .map(|(index, repertoire)| encode_repertoire(index, repertoire, config))
            .collect::<Result<Vec<_>, _>>()
    })?;

    info!(
        repertoires = encoded.len(),
        workers = config.workers,
        "Encoded dataset networks in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    Ok(encoded)
}
