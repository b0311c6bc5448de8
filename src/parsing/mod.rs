//! Readers for tab-separated repertoire, reference and dataset-sheet files.
//!
//! - **Sequence files** (`.tsv`, `.tsv.gz`): one receptor sequence per row, used for
//!   both repertoires and reference sets
//! - **Dataset sheets**: one repertoire per row, pointing at its sequence file and
//!   carrying repertoire-level labels
//!
//! ## Example
//!
//! ```rust
//! use repmatch::parsing::tsv::parse_sequences_text;
//!
//! let text = "sequence_aa\tv_call\tj_call\tchain\tduplicate_count\n\
//!             CASSLGQ\tTRBV5-1\tTRBJ2-7\tTRB\t12\n";
//! let sequences = parse_sequences_text(text).unwrap();
//!
//! assert_eq!(sequences[0].count(), 12);
//! assert_eq!(sequences[0].metadata.v_gene.as_deref(), Some("TRBV5-1"));
//! ```
//!
//! ## Recognised Columns
//!
//! | Column | Aliases | Meaning |
//! |--------|---------|---------|
//! | `sequence_aa` | `amino_acid_sequence`, `cdr3_aa` | Amino-acid string |
//! | `sequence` | `nucleotide_sequence`, `cdr3` | Nucleotide string |
//! | `sequence_id` | `identifier` | Sequence identifier (defaults to the row number) |
//! | `chain` | `locus` | Receptor chain |
//! | `v_gene` | `v_call` | V gene |
//! | `j_gene` | `j_call` | J gene |
//! | `v_subgroup`, `v_allele`, `j_subgroup`, `j_allele` | | Gene detail |
//! | `count` | `duplicate_count` | Abundance (defaults to 1) |
//! | `frame_type` | | `IN`, `OUT` or `STOP` (defaults to `IN`) |
//! | `region_type` | | `CDR3` or `FULL_SEQUENCE` |
//!
//! Any other column becomes a custom attribute. Empty cells are treated as absent.

pub mod sheet;
pub mod tsv;

use thiserror::Error;

use crate::core::SequenceError;
use crate::utils::validation::MAX_SEQUENCES_PER_FILE;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value on line {line}: {source}")]
    InvalidValue {
        line: usize,
        #[source]
        source: SequenceError,
    },

    #[error("Too many sequences: {0} exceeds maximum allowed ({MAX_SEQUENCES_PER_FILE})")]
    TooManySequences(usize),
}
