//! # repmatch
//!
//! A library for approximate matching of immune receptor repertoires against reference
//! sequence sets, and for describing repertoires by their sequence similarity networks.
//!
//! Disease-associated receptors are rarely found verbatim in another individual's
//! repertoire; close variants with the same V/J gene usage are. `repmatch` finds, for
//! every repertoire of a dataset, the sequences within a small edit distance of a
//! reference sequence whose selected metadata agrees, and summarises how much of the
//! repertoire they cover.
//!
//! ## Features
//!
//! - **Deletion-neighbourhood index**: Candidate lookup without all-pairs comparison
//! - **Metadata fingerprints**: Matches restricted to sequences with equal V gene, J gene, chain, ...
//! - **Two directions**: Detail per repertoire sequence or per reference sequence
//! - **Gene-family cross-check**: Brute-force matching on chain and V/J family
//! - **Network features**: Component, core, clique and centrality statistics per repertoire
//! - **Bounded parallelism**: One repertoire per unit of work on a fixed-size pool
//!
//! ## Example
//!
//! ```rust
//! use repmatch::{DatasetMatcher, InMemoryRepertoire, MatchingConfig, ReceptorSequence, RepertoireDataset};
//! use repmatch::matching::MatchDirection;
//!
//! let dataset = RepertoireDataset::new(vec![InMemoryRepertoire::new(
//!     "subject1",
//!     vec![ReceptorSequence::new("1", "CASSLGQF"), ReceptorSequence::new("2", "CAWRRRR")],
//! )]);
//! let references = vec![ReceptorSequence::new("ref1", "CASSLGYF")];
//!
//! let config = MatchingConfig::default()
//!     .with_metadata_attributes(Vec::new())
//!     .with_workers(1);
//! let matcher = DatasetMatcher::new(config).unwrap();
//! let result = matcher.match_dataset(&dataset, references, MatchDirection::QueryToReference).unwrap();
//!
//! assert_eq!(result.repertoires[0].unique_reads_with_match, 1);
//! assert_eq!(result.repertoires[0].pct_unique_reads_with_match, 0.5);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Receptor sequences, metadata and repertoire abstractions
//! - [`index`]: Approximate string index and edit distance
//! - [`matching`]: Projection, pairwise evaluation, repertoire and dataset matchers
//! - [`network`]: Similarity graphs and their features
//! - [`parsing`]: Readers for sequence files and dataset sheets
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod index;
pub mod matching;
pub mod network;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::repertoire::{InMemoryRepertoire, Repertoire, RepertoireDataset};
pub use crate::core::sequence::{ReceptorSequence, SequenceMetadata};
pub use crate::core::types::*;
pub use crate::index::DeletionIndex;
pub use crate::matching::{DatasetMatchResult, DatasetMatcher, MatchingConfig, RepertoireMatchResult};
pub use crate::network::{encode_dataset, NetworkConfig, SimilarityGraph};
