//! Brute-force cross-check of repertoires against references using the gene family rule.
//!
//! Unlike the indexed matcher, every sequence is compared against every reference and
//! genes are compared by name with [`genes_match`](crate::matching::evaluator::genes_match)
//! instead of through a fingerprint. Frame type is not considered.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::core::{
    Chain, ReceptorSequence, Repertoire, RepertoireDataset, RepertoireMetadata, SequenceType,
};
use crate::matching::evaluator::receptor_sequences_match;
use crate::matching::MatchError;
use crate::utils::validation::{safe_ratio, validate_max_edit_distance, validate_workers};

/// One repertoire sequence and the reference strings it matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossCheckedSequence {
    pub sequence: String,
    pub v_gene: Option<String>,
    pub j_gene: Option<String>,
    pub chain: Option<Chain>,
    pub matching_sequences: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossCheckedRepertoire {
    pub identifier: String,
    pub index: usize,
    pub sequences: Vec<CrossCheckedSequence>,

    /// Sequences with at least one matching reference
    pub sequences_matched: usize,

    /// `sequences_matched` as a fraction of all sequences (0 for an empty repertoire)
    pub percentage_of_sequences_matched: f64,

    pub metadata: RepertoireMetadata,
    pub chains: BTreeSet<Chain>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossCheckResult {
    pub repertoires: Vec<CrossCheckedRepertoire>,
}

/// Compares sequences by chain, V/J gene family and edit distance
#[derive(Debug, Clone)]
pub struct GeneMatcher {
    max_distance: u32,
    workers: usize,
    sequence_type: SequenceType,
}

impl GeneMatcher {
    /// # Errors
    ///
    /// Returns `MatchError::Config` for zero workers or an unsupported distance.
    pub fn new(max_distance: u32, workers: usize) -> Result<Self, MatchError> {
        Ok(Self {
            max_distance: validate_max_edit_distance(max_distance)?,
            workers: validate_workers(workers)?,
            sequence_type: SequenceType::AminoAcid,
        })
    }

    #[must_use]
    pub fn with_sequence_type(mut self, sequence_type: SequenceType) -> Self {
        self.sequence_type = sequence_type;
        self
    }

    /// Cross-check every repertoire in turn
    ///
    /// # Errors
    ///
    /// Fails if the worker pool cannot be built or any repertoire fails.
    pub fn match_dataset<R: Repertoire>(
        &self,
        dataset: &RepertoireDataset<R>,
        references: &[ReceptorSequence],
    ) -> Result<CrossCheckResult, MatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let repertoires = dataset
            .iter()
            .enumerate()
            .map(|(index, repertoire)| {
                pool.install(|| self.match_repertoire(index, repertoire, references))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CrossCheckResult { repertoires })
    }

    /// Cross-check one repertoire; sequences are compared in parallel on the current pool
    ///
    /// # Errors
    ///
    /// Fails if the repertoire cannot be loaded or a sequence lacks the configured
    /// sequence type.
    pub fn match_repertoire<R: Repertoire + ?Sized>(
        &self,
        index: usize,
        repertoire: &R,
        references: &[ReceptorSequence],
    ) -> Result<CrossCheckedRepertoire, MatchError> {
        let sequences = repertoire.load_sequences()?;

        let checked = sequences
            .par_iter()
            .map(|sequence| self.match_sequence(sequence, references))
            .collect::<Result<Vec<_>, _>>()?;

        let sequences_matched = checked
            .iter()
            .filter(|s| !s.matching_sequences.is_empty())
            .count();
        debug!(
            repertoire = repertoire.identifier(),
            sequences = checked.len(),
            sequences_matched,
            "Cross-checked repertoire"
        );

        Ok(CrossCheckedRepertoire {
            identifier: repertoire.identifier().to_string(),
            index,
            percentage_of_sequences_matched: safe_ratio(
                sequences_matched as u64,
                checked.len() as u64,
            ),
            sequences: checked,
            sequences_matched,
            metadata: repertoire.metadata().clone(),
            chains: sequences.iter().filter_map(|s| s.metadata.chain).collect(),
        })
    }

    fn match_sequence(
        &self,
        sequence: &ReceptorSequence,
        references: &[ReceptorSequence],
    ) -> Result<CrossCheckedSequence, MatchError> {
        let mut matching_sequences = Vec::new();
        for reference in references {
            if receptor_sequences_match(sequence, reference, self.sequence_type, self.max_distance)? {
                matching_sequences.push(reference.sequence(self.sequence_type)?.to_string());
            }
        }

        Ok(CrossCheckedSequence {
            sequence: sequence.sequence(self.sequence_type)?.to_string(),
            v_gene: sequence.metadata.v_gene.clone(),
            j_gene: sequence.metadata.j_gene.clone(),
            chain: sequence.metadata.chain,
            matching_sequences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FrameType, InMemoryRepertoire, SequenceMetadata};

    fn beta(id: &str, aa: &str, v: &str, j: &str) -> ReceptorSequence {
        ReceptorSequence::new(id, aa).with_metadata(
            SequenceMetadata::new()
                .with_chain(Chain::Beta)
                .with_v_gene(v)
                .with_j_gene(j),
        )
    }

    fn dataset() -> RepertoireDataset<InMemoryRepertoire> {
        RepertoireDataset::new(vec![
            InMemoryRepertoire::new(
                "rep1",
                vec![
                    beta("1", "CASSLGQ", "TRBV5-1", "TRBJ2-7"),
                    beta("2", "CASSLGE", "TRBV7-2", "TRBJ2-7"),
                    beta("3", "CAWSVGQ", "TRBV5", "TRBJ2"),
                ],
            )
            .with_label("CD", false),
            InMemoryRepertoire::new("rep2", vec![]),
        ])
    }

    #[test]
    fn test_gene_family_cross_check() {
        let references = vec![
            beta("r1", "CASSLGE", "TRBV5", "TRBJ2-7"),
            beta("r2", "CAWSVGE", "TRBV5-1", "TRBJ2-1"),
        ];
        let matcher = GeneMatcher::new(1, 2).unwrap();
        let result = matcher.match_dataset(&dataset(), &references).unwrap();

        let rep1 = &result.repertoires[0];
        assert_eq!(rep1.identifier, "rep1");
        assert_eq!(rep1.sequences[0].matching_sequences, vec!["CASSLGE"]);
        // TRBV7-2 is not in the TRBV5 family
        assert!(rep1.sequences[1].matching_sequences.is_empty());
        // TRBV5 matches TRBV5-1 and TRBJ2 matches TRBJ2-1
        assert_eq!(rep1.sequences[2].matching_sequences, vec!["CAWSVGE"]);
        assert_eq!(rep1.sequences_matched, 2);
        assert!((rep1.percentage_of_sequences_matched - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rep1.chains, BTreeSet::from([Chain::Beta]));
        assert_eq!(rep1.metadata["CD"], serde_json::Value::Bool(false));
    }

    #[test]
    fn test_empty_repertoire_percentage_is_zero() {
        let matcher = GeneMatcher::new(1, 1).unwrap();
        let result = matcher
            .match_dataset(&dataset(), &[beta("r1", "CASSLGE", "TRBV5", "TRBJ2-7")])
            .unwrap();
        let rep2 = &result.repertoires[1];
        assert_eq!(rep2.index, 1);
        assert_eq!(rep2.sequences_matched, 0);
        assert_eq!(rep2.percentage_of_sequences_matched, 0.0);
    }

    #[test]
    fn test_frame_type_not_filtered() {
        let out_of_frame = beta("1", "CASSLGQ", "TRBV5-1", "TRBJ2-7");
        let out_of_frame = out_of_frame
            .clone()
            .with_metadata(out_of_frame.metadata.with_frame_type(FrameType::Out));
        let dataset = RepertoireDataset::new(vec![InMemoryRepertoire::new("rep", vec![out_of_frame])]);
        let result = GeneMatcher::new(0, 1)
            .unwrap()
            .match_dataset(&dataset, &[beta("r", "CASSLGQ", "TRBV5-1", "TRBJ2-7")])
            .unwrap();
        assert_eq!(result.repertoires[0].sequences_matched, 1);
    }

    #[test]
    fn test_missing_gene_on_one_side_never_matches() {
        let reference = ReceptorSequence::new("r", "CASSLGQ")
            .with_metadata(SequenceMetadata::new().with_chain(Chain::Beta).with_j_gene("TRBJ2-7"));
        let result = GeneMatcher::new(1, 1)
            .unwrap()
            .match_dataset(&dataset(), &[reference])
            .unwrap();
        assert_eq!(result.repertoires[0].sequences_matched, 0);
    }

    #[test]
    fn test_output_order_matches_input() {
        let sequences: Vec<ReceptorSequence> = (0..50)
            .map(|i| beta(&i.to_string(), &format!("CASS{}", "G".repeat(i % 7)), "TRBV5", "TRBJ2"))
            .collect();
        let expected: Vec<String> = sequences
            .iter()
            .map(|s| s.amino_acid_sequence.clone().unwrap())
            .collect();
        let dataset = RepertoireDataset::new(vec![InMemoryRepertoire::new("rep", sequences)]);
        let result = GeneMatcher::new(1, 4)
            .unwrap()
            .match_dataset(&dataset, &[beta("r", "CASSGG", "TRBV5", "TRBJ2")])
            .unwrap();
        let observed: Vec<String> = result.repertoires[0]
            .sequences
            .iter()
            .map(|s| s.sequence.clone())
            .collect();
        assert_eq!(observed, expected);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(GeneMatcher::new(1, 0).is_err());
        assert!(GeneMatcher::new(100, 1).is_err());
    }
}
