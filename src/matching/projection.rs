use crate::core::{MetadataAttribute, ReceptorSequence, SequenceError, SequenceType};
use crate::utils::validation::stable_hash;

/// Minimal comparable form of a sequence: its string and a fingerprint of the
/// selected metadata attributes.
///
/// Two slim sequences are equal iff both fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlimSequence {
    pub sequence: String,
    pub fingerprint: u64,
}

impl SlimSequence {
    /// Project a sequence onto its string and the fingerprint of `attributes`
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::MissingSequence` if the sequence has no string of the
    /// requested type, `SequenceError::UnknownAttribute` if an attribute is absent.
    pub fn project(
        sequence: &ReceptorSequence,
        attributes: &[MetadataAttribute],
        sequence_type: SequenceType,
    ) -> Result<Self, SequenceError> {
        Ok(Self {
            sequence: sequence.sequence(sequence_type)?.to_string(),
            fingerprint: fingerprint(sequence, attributes)?,
        })
    }

    /// Join key derived from both fields
    #[must_use]
    pub fn key(&self) -> u64 {
        let fingerprint = self.fingerprint.to_string();
        stable_hash(&[Some(self.sequence.as_str()), Some(fingerprint.as_str())])
    }
}

/// Hash of the selected attribute values.
///
/// Attributes are put in canonical order (sorted by name, duplicates removed) before
/// hashing, so the order in which the caller lists them does not matter.
///
/// # Errors
///
/// Returns `SequenceError::UnknownAttribute` if a requested attribute does not exist on
/// the sequence's metadata.
pub fn fingerprint(
    sequence: &ReceptorSequence,
    attributes: &[MetadataAttribute],
) -> Result<u64, SequenceError> {
    let mut canonical: Vec<&MetadataAttribute> = attributes.iter().collect();
    canonical.sort_by(|a, b| a.name().cmp(b.name()));
    canonical.dedup_by(|a, b| a.name() == b.name());

    let mut values = Vec::with_capacity(canonical.len() * 2);
    for attribute in canonical {
        values.push((attribute.name(), sequence.attribute(attribute)?));
    }

    let fields: Vec<Option<&str>> = values
        .iter()
        .flat_map(|(name, value)| [Some(*name), value.as_deref()])
        .collect();
    Ok(stable_hash(&fields))
}

/// A sequence together with its projection and join key
#[derive(Debug, Clone)]
pub struct HashedSequence {
    pub hash: u64,
    pub original: ReceptorSequence,
    pub slim: SlimSequence,
}

impl HashedSequence {
    /// # Errors
    ///
    /// As [`SlimSequence::project`].
    pub fn new(
        original: ReceptorSequence,
        attributes: &[MetadataAttribute],
        sequence_type: SequenceType,
    ) -> Result<Self, SequenceError> {
        let slim = SlimSequence::project(&original, attributes, sequence_type)?;
        Ok(Self {
            hash: slim.key(),
            original,
            slim,
        })
    }
}

/// Project a list of sequences, preserving order
///
/// # Errors
///
/// Fails on the first sequence that cannot be projected.
pub fn hash_sequences(
    sequences: &[ReceptorSequence],
    attributes: &[MetadataAttribute],
    sequence_type: SequenceType,
) -> Result<Vec<HashedSequence>, SequenceError> {
    sequences
        .iter()
        .map(|sequence| HashedSequence::new(sequence.clone(), attributes, sequence_type))
        .collect()
}
