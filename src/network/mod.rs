//! Similarity networks over repertoire sequences and their topological features.
//!
//! - [`SimilarityGraph`]: Undirected graph joining distinct strings within an edit distance
//! - [`compute_features`]: Fixed, named feature vector of a graph
//! - [`encode_dataset`]: Features for every repertoire of a dataset on a worker pool
//!
//! ## Example
//!
//! ```rust
//! use repmatch::network::{compute_features, FeatureSet, SimilarityGraph};
//!
//! let graph = SimilarityGraph::construct(["CASSF", "CASSY", "GGGGG"], 1).unwrap();
//! let features = compute_features(&graph, FeatureSet::Standard);
//!
//! assert_eq!(features.values.len(), 20);
//! assert_eq!(features.get("n_component"), Some(2.0));
//! ```

pub mod centrality;
pub mod encode;
pub mod features;
pub mod graph;

use thiserror::Error;

use crate::core::{RepertoireError, SequenceError};
use crate::index::IndexError;
use crate::utils::validation::ValidationError;

pub use encode::{encode_dataset, encode_repertoire, NetworkConfig, RepertoireNetworkFeatures};
pub use features::{compute_features, FeatureSet, NetworkFeatures};
pub use graph::SimilarityGraph;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Repertoire(#[from] RepertoireError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
