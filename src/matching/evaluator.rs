//! Pairwise match decisions.

use crate::core::{ReceptorSequence, SequenceError, SequenceType};
use crate::index::within_edit_distance;
use crate::matching::projection::SlimSequence;

/// Whether two projected sequences already known to be within the edit-distance
/// budget constitute a match.
///
/// Fingerprints must be equal; with `same_length_required` the strings must also have
/// equal length.
#[must_use]
pub fn slim_sequences_match(a: &SlimSequence, b: &SlimSequence, same_length_required: bool) -> bool {
    if same_length_required && a.sequence.len() != b.sequence.len() {
        return false;
    }
    a.fingerprint == b.fingerprint
}

/// Gene family: the part of the name before the first `-`
fn gene_family(gene: &str) -> &str {
    gene.split_once('-').map_or(gene, |(family, _)| family)
}

/// Two gene names match if identical, or if the family of either equals the other.
///
/// ```
/// use repmatch::matching::evaluator::genes_match;
///
/// assert!(genes_match("TRBV5-1", "TRBV5"));
/// assert!(genes_match("TRBV5", "TRBV5-1"));
/// assert!(!genes_match("TRBV5-1", "TRBV7-2"));
/// ```
#[must_use]
pub fn genes_match(gene1: &str, gene2: &str) -> bool {
    gene1 == gene2 || gene_family(gene2) == gene1 || gene_family(gene1) == gene2
}

/// [`genes_match`] over optional genes: two absent genes match, one absent gene never does
#[must_use]
pub fn optional_genes_match(gene1: Option<&str>, gene2: Option<&str>) -> bool {
    match (gene1, gene2) {
        (None, None) => true,
        (Some(a), Some(b)) => genes_match(a, b),
        _ => false,
    }
}

/// Raw receptor-level match used by the gene cross-check: same chain, compatible V and
/// J genes, and strings within `max_distance` edits.
///
/// # Errors
///
/// Returns `SequenceError::MissingSequence` if either sequence lacks a string of the
/// requested type.
pub fn receptor_sequences_match(
    original: &ReceptorSequence,
    reference: &ReceptorSequence,
    sequence_type: SequenceType,
    max_distance: u32,
) -> Result<bool, SequenceError> {
    let (a, b) = (&original.metadata, &reference.metadata);
    if a.chain != b.chain
        || !optional_genes_match(b.v_gene.as_deref(), a.v_gene.as_deref())
        || !optional_genes_match(b.j_gene.as_deref(), a.j_gene.as_deref())
    {
        return Ok(false);
    }
    Ok(within_edit_distance(
        original.sequence(sequence_type)?,
        reference.sequence(sequence_type)?,
        max_distance,
    ))
}
