//! Approximate matching of repertoire sequences against reference sequences.
//!
//! This module provides the matching functionality:
//!
//! - [`SlimSequence`], [`HashedSequence`]: Projection of a sequence to its comparable form
//! - [`RepertoireMatcher`]: Matches one repertoire in either direction
//! - [`DatasetMatcher`]: Fans the repertoire matcher out over a dataset on a worker pool
//! - [`GeneMatcher`]: Brute-force cross-check using the gene family rule
//!
//! ## Matching Algorithm
//!
//! 1. **Filter**: only in-frame repertoire sequences take part in matching
//! 2. **Project**: each sequence becomes a string plus a fingerprint of the selected
//!    metadata attributes
//! 3. **Group**: repertoire projections are grouped by string value
//! 4. **Index**: distinct repertoire strings go into a deletion-neighbourhood index
//! 5. **Query**: each reference string is looked up within the edit-distance budget and
//!    every candidate with an equal fingerprint yields a (query, reference) pair
//!
//! Both directions compute the same pair set; they differ only in which side the
//! per-sequence detail is reported from.
//!
//! ## Example
//!
//! ```rust
//! use repmatch::core::{InMemoryRepertoire, ReceptorSequence, RepertoireDataset};
//! use repmatch::matching::{DatasetMatcher, MatchDirection, MatchingConfig};
//!
//! let repertoire = InMemoryRepertoire::new(
//!     "rep1",
//!     vec![ReceptorSequence::new("1", "CASSF"), ReceptorSequence::new("2", "CAWWW")],
//! );
//! let dataset = RepertoireDataset::new(vec![repertoire]);
//! let references = vec![ReceptorSequence::new("r1", "CASSY")];
//!
//! let matcher = DatasetMatcher::new(MatchingConfig::default().with_workers(1)).unwrap();
//! let result = matcher
//!     .match_dataset(&dataset, references, MatchDirection::QueryToReference)
//!     .unwrap();
//!
//! assert_eq!(result.repertoires[0].unique_reads_with_match, 1);
//! ```

pub mod config;
pub mod crosscheck;
pub mod dataset;
pub mod engine;
pub mod evaluator;
pub mod projection;
pub mod result;

use thiserror::Error;

use crate::core::{RepertoireError, SequenceError};
use crate::index::IndexError;
use crate::utils::validation::ValidationError;

pub use config::{MatchDirection, MatchingConfig};
pub use crosscheck::{CrossCheckResult, CrossCheckedRepertoire, CrossCheckedSequence, GeneMatcher};
pub use dataset::DatasetMatcher;
pub use engine::{evaluate_repertoire_matches, MatchPairSet, RepertoireMatcher};
pub use projection::{HashedSequence, SlimSequence};
pub use result::{
    DatasetMatchResult, MatchDetail, MatchedQuerySequence, MatchedReferenceSequence,
    RepertoireMatchResult, SummaryType,
};

#[derive(Error, Debug)]
pub enum MatchError {
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
