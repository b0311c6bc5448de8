use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::core::{
    Chain, MetadataAttribute, ReceptorSequence, RepertoireMetadata, SequenceError, SequenceRecord,
    SequenceType,
};
use crate::matching::config::MatchDirection;
use crate::matching::engine::MatchPairSet;
use crate::utils::validation::{count_to_f64, safe_ratio};

/// A repertoire sequence and the reference sequences it matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedQuerySequence {
    pub query_sequence: SequenceRecord,
    pub matching_reference_sequences: Vec<SequenceRecord>,
}

/// A reference sequence and the repertoire sequences matching it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedReferenceSequence {
    pub reference_sequence: SequenceRecord,
    pub matching_query_sequences: Vec<SequenceRecord>,
}

impl MatchedReferenceSequence {
    /// Sum of the abundances of the matching repertoire sequences
    #[must_use]
    pub fn matching_count(&self) -> u64 {
        self.matching_query_sequences
            .iter()
            .filter_map(|record| record.get("count").and_then(serde_json::Value::as_u64))
            .sum()
    }
}

/// Per-sequence match lists, reported from the side chosen by the match direction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDetail {
    QuerySequences(Vec<MatchedQuerySequence>),
    ReferenceSequences(Vec<MatchedReferenceSequence>),
}

/// Match outcome for one repertoire
#[derive(Debug, Clone, Serialize)]
pub struct RepertoireMatchResult {
    pub identifier: String,

    /// Position of the repertoire in its dataset
    pub index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,

    pub metadata: RepertoireMetadata,

    pub chains: BTreeSet<Chain>,

    pub direction: MatchDirection,

    /// Sum of counts over all sequences, in-frame or not
    pub total_reads: u64,

    /// Number of sequences, in-frame or not
    pub unique_reads: u64,

    pub total_reads_with_match: u64,
    pub unique_reads_with_match: u64,
    pub pct_total_reads_with_match: f64,
    pub pct_unique_reads_with_match: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<MatchDetail>,

    /// (query hash, reference hash) pairs found for this repertoire
    #[serde(skip)]
    pub match_pairs: MatchPairSet,
}

impl RepertoireMatchResult {
    /// One value per reference sequence, in reference order.
    ///
    /// Requires reference-side detail; returns an empty list otherwise. Percentages are
    /// on a 0-100 scale and zero when the repertoire is empty.
    #[must_use]
    pub fn reference_feature_values(&self, summary: SummaryType) -> Vec<f64> {
        let Some(MatchDetail::ReferenceSequences(references)) = &self.detail else {
            return Vec::new();
        };

        references
            .iter()
            .map(|reference| {
                let unique = reference.matching_query_sequences.len() as u64;
                let total = reference.matching_count();
                match summary {
                    SummaryType::UniqueReadsWithMatch => count_to_f64(unique),
                    SummaryType::PctUniqueReadsWithMatch => 100.0 * safe_ratio(unique, self.unique_reads),
                    SummaryType::TotalReadsWithMatch => count_to_f64(total),
                    SummaryType::PctTotalReadsWithMatch => 100.0 * safe_ratio(total, self.total_reads),
                }
            })
            .collect()
    }
}

/// Match outcome for a whole dataset, in input repertoire order
#[derive(Debug, Clone, Serialize)]
pub struct DatasetMatchResult {
    pub direction: MatchDirection,
    pub repertoires: Vec<RepertoireMatchResult>,
    pub reference_sequences: Vec<ReceptorSequence>,
}

impl DatasetMatchResult {
    /// Feature names matching [`RepertoireMatchResult::reference_feature_values`]
    ///
    /// # Errors
    ///
    /// Fails if a reference lacks the sequence type or one of the attributes.
    pub fn reference_feature_names(
        &self,
        attributes: &[MetadataAttribute],
        sequence_type: SequenceType,
    ) -> Result<Vec<String>, SequenceError> {
        reference_feature_names(&self.reference_sequences, attributes, sequence_type)
    }
}

/// Name of each reference feature: the sequence string, then the selected attribute
/// values, joined by `-`.
///
/// # Errors
///
/// Fails if a reference lacks the sequence type or one of the attributes.
pub fn reference_feature_names(
    references: &[ReceptorSequence],
    attributes: &[MetadataAttribute],
    sequence_type: SequenceType,
) -> Result<Vec<String>, SequenceError> {
    references
        .iter()
        .map(|reference| {
            let mut parts = vec![reference.sequence(sequence_type)?.to_string()];
            for attribute in attributes {
                parts.push(reference.attribute(attribute)?.unwrap_or_default());
            }
            Ok(parts.join("-"))
        })
        .collect()
}

/// Repertoire-level summary features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    TotalReadsWithMatch,
    PctTotalReadsWithMatch,
    UniqueReadsWithMatch,
    PctUniqueReadsWithMatch,
}

impl SummaryType {
    pub const ALL: [Self; 4] = [
        Self::TotalReadsWithMatch,
        Self::PctTotalReadsWithMatch,
        Self::UniqueReadsWithMatch,
        Self::PctUniqueReadsWithMatch,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TotalReadsWithMatch => "total_reads_with_match",
            Self::PctTotalReadsWithMatch => "pct_total_reads_with_match",
            Self::UniqueReadsWithMatch => "unique_reads_with_match",
            Self::PctUniqueReadsWithMatch => "pct_unique_reads_with_match",
        }
    }

    /// The summary value of a repertoire result (percentages as fractions)
    #[must_use]
    pub fn value(&self, result: &RepertoireMatchResult) -> f64 {
        match self {
            Self::TotalReadsWithMatch => count_to_f64(result.total_reads_with_match),
            Self::PctTotalReadsWithMatch => result.pct_total_reads_with_match,
            Self::UniqueReadsWithMatch => count_to_f64(result.unique_reads_with_match),
            Self::PctUniqueReadsWithMatch => result.pct_unique_reads_with_match,
        }
    }
}

impl std::fmt::Display for SummaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
