use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::debug;

use crate::core::{Chain, Repertoire};
use crate::index::{DeletionIndex, IndexError};
use crate::matching::config::{MatchDirection, MatchingConfig};
use crate::matching::evaluator::slim_sequences_match;
use crate::matching::projection::{HashedSequence, SlimSequence};
use crate::matching::result::{
    MatchDetail, MatchedQuerySequence, MatchedReferenceSequence, RepertoireMatchResult,
};
use crate::matching::MatchError;
use crate::utils::validation::safe_ratio;

/// Set of (query hash, reference hash) pairs, one per compatible near-duplicate
pub type MatchPairSet = BTreeSet<(u64, u64)>;

/// Adjacency from one side's hashes to the other side's
type AdjacencyMap = BTreeMap<u64, BTreeSet<u64>>;

/// Group projected sequences by string value, keeping every distinct projection
/// with its join key.
#[must_use]
pub fn generate_slim_sequence_map(
    hashed: &[HashedSequence],
) -> BTreeMap<&str, BTreeMap<&SlimSequence, u64>> {
    let mut mapping: BTreeMap<&str, BTreeMap<&SlimSequence, u64>> = BTreeMap::new();
    for sequence in hashed {
        mapping
            .entry(sequence.slim.sequence.as_str())
            .or_default()
            .insert(&sequence.slim, sequence.hash);
    }
    mapping
}

/// Find every compatible (query, reference) pair within `max_edit_distance` edits.
///
/// The query side is indexed; each reference string is looked up once.
///
/// # Errors
///
/// Propagates index lookup errors.
pub fn evaluate_repertoire_matches(
    query: &[HashedSequence],
    reference: &[HashedSequence],
    same_length_required: bool,
    max_edit_distance: u32,
) -> Result<MatchPairSet, IndexError> {
    let slim_map = generate_slim_sequence_map(query);
    let index = DeletionIndex::build(slim_map.keys().copied(), max_edit_distance);

    let mut pairs = MatchPairSet::new();
    for hashed_reference in reference {
        for candidate in index.lookup(&hashed_reference.slim.sequence, max_edit_distance)? {
            let Some(slims) = slim_map.get(candidate) else {
                continue;
            };
            for (slim, query_hash) in slims {
                if slim_sequences_match(&hashed_reference.slim, slim, same_length_required) {
                    pairs.insert((*query_hash, hashed_reference.hash));
                }
            }
        }
    }
    Ok(pairs)
}

fn query_to_reference_map(pairs: &MatchPairSet) -> AdjacencyMap {
    let mut mapping = AdjacencyMap::new();
    for (query, reference) in pairs {
        mapping.entry(*query).or_default().insert(*reference);
    }
    mapping
}

fn reference_to_query_map(pairs: &MatchPairSet) -> AdjacencyMap {
    let mut mapping = AdjacencyMap::new();
    for (query, reference) in pairs {
        mapping.entry(*reference).or_default().insert(*query);
    }
    mapping
}

/// Matches single repertoires against a precomputed reference list
pub struct RepertoireMatcher<'a> {
    references: &'a [HashedSequence],
    config: &'a MatchingConfig,
}

impl<'a> RepertoireMatcher<'a> {
    /// `references` must have been projected with `config.metadata_attributes`
    #[must_use]
    pub fn new(references: &'a [HashedSequence], config: &'a MatchingConfig) -> Self {
        Self { references, config }
    }

    /// Load, match and summarize one repertoire.
    ///
    /// Out-of-frame sequences are excluded from matching but still counted in
    /// `total_reads` and `unique_reads`.
    ///
    /// # Errors
    ///
    /// Fails if the repertoire cannot be loaded or an in-frame sequence cannot be
    /// projected.
    pub fn match_repertoire<R: Repertoire + ?Sized>(
        &self,
        index: usize,
        repertoire: &R,
        direction: MatchDirection,
    ) -> Result<RepertoireMatchResult, MatchError> {
        let start = Instant::now();
        let sequences = repertoire.load_sequences()?;

        let total_reads: u64 = sequences.iter().map(|s| s.count()).sum();
        let unique_reads = sequences.len() as u64;
        let chains: BTreeSet<Chain> = sequences.iter().filter_map(|s| s.metadata.chain).collect();

        let query = sequences
            .into_iter()
            .filter(|s| s.is_in_frame())
            .map(|s| {
                HashedSequence::new(
                    s,
                    &self.config.metadata_attributes,
                    self.config.sequence_type,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let match_pairs = evaluate_repertoire_matches(
            &query,
            self.references,
            self.config.same_length_required,
            self.config.max_edit_distance,
        )?;

        let query_adjacency = query_to_reference_map(&match_pairs);
        let matched_query: Vec<&HashedSequence> = query
            .iter()
            .filter(|q| query_adjacency.contains_key(&q.hash))
            .collect();
        let unique_reads_with_match = matched_query.len() as u64;
        let total_reads_with_match: u64 = matched_query.iter().map(|q| q.original.count()).sum();

        let detail = if self.config.include_detail {
            Some(match direction {
                MatchDirection::QueryToReference => {
                    MatchDetail::QuerySequences(self.query_detail(&query, &query_adjacency))
                }
                MatchDirection::ReferenceToQuery => MatchDetail::ReferenceSequences(
                    self.reference_detail(&query, &reference_to_query_map(&match_pairs)),
                ),
            })
        } else {
            None
        };

        debug!(
            repertoire = repertoire.identifier(),
            in_frame = query.len(),
            pairs = match_pairs.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Matched repertoire"
        );

        Ok(RepertoireMatchResult {
            identifier: repertoire.identifier().to_string(),
            index,
            filename: repertoire.filename().map(std::path::Path::to_path_buf),
            metadata: repertoire.metadata().clone(),
            chains,
            direction,
            total_reads,
            unique_reads,
            total_reads_with_match,
            unique_reads_with_match,
            pct_total_reads_with_match: safe_ratio(total_reads_with_match, total_reads),
            pct_unique_reads_with_match: safe_ratio(unique_reads_with_match, unique_reads),
            detail,
            match_pairs,
        })
    }

    fn query_detail(
        &self,
        query: &[HashedSequence],
        adjacency: &AdjacencyMap,
    ) -> Vec<MatchedQuerySequence> {
        let sequence_type = self.config.sequence_type;
        query
            .iter()
            .map(|q| {
                let matching_reference_sequences = adjacency.get(&q.hash).map_or_else(Vec::new, |hashes| {
                    self.references
                        .iter()
                        .filter(|r| hashes.contains(&r.hash))
                        .map(|r| r.original.record(sequence_type))
                        .collect()
                });
                MatchedQuerySequence {
                    query_sequence: q.original.record(sequence_type),
                    matching_reference_sequences,
                }
            })
            .collect()
    }

    fn reference_detail(
        &self,
        query: &[HashedSequence],
        adjacency: &AdjacencyMap,
    ) -> Vec<MatchedReferenceSequence> {
        let sequence_type = self.config.sequence_type;
        self.references
            .iter()
            .map(|r| {
                let matching_query_sequences = adjacency.get(&r.hash).map_or_else(Vec::new, |hashes| {
                    query
                        .iter()
                        .filter(|q| hashes.contains(&q.hash))
                        .map(|q| q.original.record(sequence_type))
                        .collect()
                });
                MatchedReferenceSequence {
                    reference_sequence: r.original.record(sequence_type),
                    matching_query_sequences,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        FrameType, InMemoryRepertoire, MetadataAttribute, ReceptorSequence, SequenceMetadata,
        SequenceType,
    };
    use crate::matching::projection::hash_sequences;

    fn alpha(id: &str, aa: &str, count: u64) -> ReceptorSequence {
        ReceptorSequence::new(id, aa)
            .with_metadata(SequenceMetadata::new().with_chain(Chain::Alpha).with_count(count))
    }

    fn repertoire() -> InMemoryRepertoire {
        InMemoryRepertoire::new(
            "rep1",
            vec![
                alpha("1", "AAAAAA", 3),
                alpha("2", "CCCCCC", 2),
                alpha("3", "AAAACC", 1),
                alpha("4", "TADQVF", 4),
            ],
        )
        .with_filename("rep1.tsv")
        .with_label("CD", true)
    }

    fn references() -> Vec<ReceptorSequence> {
        vec![alpha("r1", "AAAACA", 1), alpha("r2", "TADQV", 1)]
    }

    fn config() -> MatchingConfig {
        MatchingConfig::default()
            .with_metadata_attributes(vec![
                MetadataAttribute::VGene,
                MetadataAttribute::JGene,
                MetadataAttribute::Chain,
            ])
            .with_max_edit_distance(1)
            .with_detail(true)
    }

    fn run(config: &MatchingConfig, direction: MatchDirection) -> RepertoireMatchResult {
        let refs = hash_sequences(&references(), &config.metadata_attributes, config.sequence_type)
            .unwrap();
        RepertoireMatcher::new(&refs, config)
            .match_repertoire(0, &repertoire(), direction)
            .unwrap()
    }

    #[test]
    fn test_example_scenario() {
        let result = run(&config(), MatchDirection::QueryToReference);

        assert_eq!(result.identifier, "rep1");
        assert_eq!(result.unique_reads, 4);
        assert_eq!(result.total_reads, 10);
        assert_eq!(result.unique_reads_with_match, 3);
        assert_eq!(result.total_reads_with_match, 8);
        assert!((result.pct_total_reads_with_match - 0.8).abs() < 1e-12);
        assert!((result.pct_unique_reads_with_match - 0.75).abs() < 1e-12);
        assert_eq!(result.match_pairs.len(), 3);
        assert_eq!(result.chains, BTreeSet::from([Chain::Alpha]));
        assert_eq!(result.metadata["CD"], serde_json::Value::Bool(true));

        let Some(MatchDetail::QuerySequences(detail)) = &result.detail else {
            panic!("expected query detail");
        };
        let matched: Vec<(&str, Vec<&str>)> = detail
            .iter()
            .map(|m| {
                (
                    m.query_sequence["sequence"].as_str().unwrap(),
                    m.matching_reference_sequences
                        .iter()
                        .map(|r| r["sequence"].as_str().unwrap())
                        .collect(),
                )
            })
            .collect();
        assert_eq!(
            matched,
            vec![
                ("AAAAAA", vec!["AAAACA"]),
                ("CCCCCC", vec![]),
                ("AAAACC", vec!["AAAACA"]),
                ("TADQVF", vec!["TADQV"]),
            ]
        );
    }

    #[test]
    fn test_reference_direction_detail() {
        let result = run(&config(), MatchDirection::ReferenceToQuery);
        assert_eq!(result.unique_reads_with_match, 3);

        let Some(MatchDetail::ReferenceSequences(detail)) = &result.detail else {
            panic!("expected reference detail");
        };
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0].reference_sequence["sequence"], "AAAACA");
        let first: Vec<&str> = detail[0]
            .matching_query_sequences
            .iter()
            .map(|q| q["sequence"].as_str().unwrap())
            .collect();
        assert_eq!(first, vec!["AAAAAA", "AAAACC"]);
        assert_eq!(detail[0].matching_count(), 4);
        assert_eq!(detail[1].matching_query_sequences.len(), 1);
    }

    #[test]
    fn test_directions_share_pair_set() {
        let forward = run(&config(), MatchDirection::QueryToReference);
        let backward = run(&config(), MatchDirection::ReferenceToQuery);
        assert_eq!(forward.match_pairs, backward.match_pairs);
    }

    #[test]
    fn test_same_length_required() {
        let result = run(
            &config().with_same_length_required(true),
            MatchDirection::QueryToReference,
        );
        // TADQVF <-> TADQV differs in length
        assert_eq!(result.unique_reads_with_match, 2);
        assert_eq!(result.total_reads_with_match, 4);
    }

    #[test]
    fn test_fingerprint_mismatch_blocks_match() {
        let refs = vec![ReceptorSequence::new("r1", "AAAACA").with_metadata(
            SequenceMetadata::new().with_chain(Chain::Beta),
        )];
        let config = config();
        let hashed = hash_sequences(&refs, &config.metadata_attributes, SequenceType::AminoAcid)
            .unwrap();
        let result = RepertoireMatcher::new(&hashed, &config)
            .match_repertoire(0, &repertoire(), MatchDirection::QueryToReference)
            .unwrap();
        assert_eq!(result.unique_reads_with_match, 0);

        // Without chain in the fingerprint the chains no longer need to agree
        let config = config.with_metadata_attributes(vec![]);
        let hashed = hash_sequences(&refs, &config.metadata_attributes, SequenceType::AminoAcid)
            .unwrap();
        let result = RepertoireMatcher::new(&hashed, &config)
            .match_repertoire(0, &repertoire(), MatchDirection::QueryToReference)
            .unwrap();
        assert_eq!(result.unique_reads_with_match, 2);
    }

    #[test]
    fn test_out_of_frame_excluded_but_counted() {
        let repertoire = InMemoryRepertoire::new(
            "rep2",
            vec![
                alpha("1", "AAAAAA", 3),
                ReceptorSequence::new("2", "AAAACC").with_metadata(
                    SequenceMetadata::new()
                        .with_chain(Chain::Alpha)
                        .with_count(5)
                        .with_frame_type(FrameType::Out),
                ),
            ],
        );
        let config = config();
        let refs = hash_sequences(&references(), &config.metadata_attributes, config.sequence_type)
            .unwrap();
        let result = RepertoireMatcher::new(&refs, &config)
            .match_repertoire(1, &repertoire, MatchDirection::QueryToReference)
            .unwrap();

        assert_eq!(result.index, 1);
        assert_eq!(result.unique_reads, 2);
        assert_eq!(result.total_reads, 8);
        assert_eq!(result.unique_reads_with_match, 1);
        assert_eq!(result.total_reads_with_match, 3);
        let Some(MatchDetail::QuerySequences(detail)) = &result.detail else {
            panic!("expected query detail");
        };
        assert_eq!(detail.len(), 1);
    }

    #[test]
    fn test_empty_reference_list() {
        let config = config();
        let result = RepertoireMatcher::new(&[], &config)
            .match_repertoire(0, &repertoire(), MatchDirection::ReferenceToQuery)
            .unwrap();
        assert!(result.match_pairs.is_empty());
        assert_eq!(result.total_reads_with_match, 0);
        assert_eq!(result.pct_total_reads_with_match, 0.0);
        assert_eq!(result.detail, Some(MatchDetail::ReferenceSequences(vec![])));
    }

    #[test]
    fn test_no_in_frame_sequences() {
        let repertoire = InMemoryRepertoire::new(
            "rep3",
            vec![ReceptorSequence::new("1", "AAAAAA")
                .with_metadata(SequenceMetadata::new().with_frame_type(FrameType::Stop))],
        );
        let config = config();
        let refs = hash_sequences(&references(), &config.metadata_attributes, config.sequence_type)
            .unwrap();
        let result = RepertoireMatcher::new(&refs, &config)
            .match_repertoire(0, &repertoire, MatchDirection::QueryToReference)
            .unwrap();
        assert_eq!(result.unique_reads_with_match, 0);
        assert_eq!(result.pct_unique_reads_with_match, 0.0);
        assert!(result.chains.is_empty());
    }

    #[test]
    fn test_empty_repertoire() {
        let config = config();
        let refs = hash_sequences(&references(), &config.metadata_attributes, config.sequence_type)
            .unwrap();
        let result = RepertoireMatcher::new(&refs, &config)
            .match_repertoire(0, &InMemoryRepertoire::new("empty", vec![]), MatchDirection::QueryToReference)
            .unwrap();
        assert_eq!(result.unique_reads, 0);
        assert_eq!(result.pct_unique_reads_with_match, 0.0);
        assert_eq!(result.pct_total_reads_with_match, 0.0);
    }

    #[test]
    fn test_duplicate_strings_with_distinct_fingerprints() {
        let query = hash_sequences(
            &[
                ReceptorSequence::new("1", "CASSF")
                    .with_metadata(SequenceMetadata::new().with_v_gene("TRBV5-1")),
                ReceptorSequence::new("2", "CASSF")
                    .with_metadata(SequenceMetadata::new().with_v_gene("TRBV7-2")),
            ],
            &[MetadataAttribute::VGene],
            SequenceType::AminoAcid,
        )
        .unwrap();
        let reference = hash_sequences(
            &[ReceptorSequence::new("r", "CASSY")
                .with_metadata(SequenceMetadata::new().with_v_gene("TRBV7-2"))],
            &[MetadataAttribute::VGene],
            SequenceType::AminoAcid,
        )
        .unwrap();

        let pairs = evaluate_repertoire_matches(&query, &reference, false, 1).unwrap();
        assert_eq!(pairs, MatchPairSet::from([(query[1].hash, reference[0].hash)]));
    }

    #[test]
    fn test_missing_attribute_fails() {
        let config = config().with_metadata_attributes(vec![MetadataAttribute::from("epitope")]);
        let result = RepertoireMatcher::new(&[], &config).match_repertoire(
            0,
            &repertoire(),
            MatchDirection::QueryToReference,
        );
        assert!(matches!(result, Err(MatchError::Sequence(_))));
    }
}
