//! Core data types for immune-repertoire matching.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ReceptorSequence`]: A single receptor sequence with its gene and abundance metadata
//! - [`SequenceMetadata`]: Chain, V/J genes, count, frame and region type, custom attributes
//! - [`MetadataAttribute`]: Selector for one metadata field, used to build fingerprints
//! - [`Repertoire`], [`RepertoireDataset`]: Lazily loaded collections of sequences
//! - [`Chain`], [`FrameType`], [`RegionType`], [`SequenceType`]: Metadata value types
//!
//! ## Gene Naming
//!
//! Gene names are kept verbatim. The only structural interpretation applied anywhere
//! in the crate is the *family prefix*: the part of a gene name before the first `-`
//! (`TRBV5-1` belongs to family `TRBV5`). See
//! [`genes_match`](crate::matching::evaluator::genes_match).

pub mod repertoire;
pub mod sequence;
pub mod types;

pub use repertoire::{
    InMemoryRepertoire, Repertoire, RepertoireDataset, RepertoireError, RepertoireMetadata,
};
pub use sequence::{ReceptorSequence, SequenceError, SequenceMetadata, SequenceRecord};
pub use types::{Chain, FrameType, MetadataAttribute, RegionType, SequenceType};
