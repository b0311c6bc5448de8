use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::types::{Chain, FrameType, MetadataAttribute, RegionType, SequenceType};

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Unknown metadata attribute '{attribute}' on sequence '{identifier}'")]
    UnknownAttribute {
        attribute: String,
        identifier: String,
    },

    #[error("Invalid {kind} value: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error("Sequence '{identifier}' has no {sequence_type} sequence")]
    MissingSequence {
        identifier: String,
        sequence_type: SequenceType,
    },
}

/// Dict-like view of a sequence and all of its metadata, used in match detail output
pub type SequenceRecord = serde_json::Map<String, serde_json::Value>;

/// Gene usage, abundance and annotation of a receptor sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Chain>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_gene: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_subgroup: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_allele: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_gene: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_subgroup: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub j_allele: Option<String>,

    /// Abundance (number of reads or cells carrying this sequence)
    #[serde(default = "default_count")]
    pub count: u64,

    #[serde(default)]
    pub frame_type: FrameType,

    #[serde(default)]
    pub region_type: RegionType,

    /// Arbitrary named attributes (e.g. epitope, donor)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

fn default_count() -> u64 {
    1
}

impl Default for SequenceMetadata {
    fn default() -> Self {
        Self {
            chain: None,
            v_gene: None,
            v_subgroup: None,
            v_allele: None,
            j_gene: None,
            j_subgroup: None,
            j_allele: None,
            count: default_count(),
            frame_type: FrameType::In,
            region_type: RegionType::Cdr3,
            custom: BTreeMap::new(),
        }
    }
}

impl SequenceMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    #[must_use]
    pub fn with_v_gene(mut self, gene: impl Into<String>) -> Self {
        self.v_gene = Some(gene.into());
        self
    }

    #[must_use]
    pub fn with_j_gene(mut self, gene: impl Into<String>) -> Self {
        self.j_gene = Some(gene.into());
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = frame_type;
        self
    }

    #[must_use]
    pub fn with_custom(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(name.into(), value.into());
        self
    }

    /// Look up one attribute.
    ///
    /// Returns `None` when the attribute does not exist on this metadata object (only
    /// possible for custom attributes), `Some(None)` when a standard field is unset.
    #[must_use]
    pub fn attribute(&self, attribute: &MetadataAttribute) -> Option<Option<String>> {
        let value = match attribute {
            MetadataAttribute::Chain => self.chain.map(|c| c.code().to_string()),
            MetadataAttribute::VGene => self.v_gene.clone(),
            MetadataAttribute::VSubgroup => self.v_subgroup.clone(),
            MetadataAttribute::VAllele => self.v_allele.clone(),
            MetadataAttribute::JGene => self.j_gene.clone(),
            MetadataAttribute::JSubgroup => self.j_subgroup.clone(),
            MetadataAttribute::JAllele => self.j_allele.clone(),
            MetadataAttribute::Count => Some(self.count.to_string()),
            MetadataAttribute::FrameType => Some(self.frame_type.to_string()),
            MetadataAttribute::RegionType => Some(self.region_type.to_string()),
            MetadataAttribute::Custom(name) => return self.custom.get(name).cloned().map(Some),
        };
        Some(value)
    }
}

/// A receptor sequence as delivered by a repertoire or reference source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptorSequence {
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amino_acid_sequence: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nucleotide_sequence: Option<String>,

    #[serde(default)]
    pub metadata: SequenceMetadata,
}

impl ReceptorSequence {
    /// Create an amino-acid sequence with default metadata
    pub fn new(identifier: impl Into<String>, amino_acid_sequence: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            amino_acid_sequence: Some(amino_acid_sequence.into()),
            nucleotide_sequence: None,
            metadata: SequenceMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_nucleotide(mut self, nucleotide_sequence: impl Into<String>) -> Self {
        self.nucleotide_sequence = Some(nucleotide_sequence.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: SequenceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The sequence string of the requested alphabet
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::MissingSequence` if this record has no sequence of that type.
    pub fn sequence(&self, sequence_type: SequenceType) -> Result<&str, SequenceError> {
        let sequence = match sequence_type {
            SequenceType::AminoAcid => self.amino_acid_sequence.as_deref(),
            SequenceType::Nucleotide => self.nucleotide_sequence.as_deref(),
        };
        sequence.ok_or_else(|| SequenceError::MissingSequence {
            identifier: self.identifier.clone(),
            sequence_type,
        })
    }

    /// Look up one metadata attribute, failing if it does not exist on this sequence
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::UnknownAttribute` for a custom attribute this sequence lacks.
    pub fn attribute(&self, attribute: &MetadataAttribute) -> Result<Option<String>, SequenceError> {
        self.metadata
            .attribute(attribute)
            .ok_or_else(|| SequenceError::UnknownAttribute {
                attribute: attribute.name().to_string(),
                identifier: self.identifier.clone(),
            })
    }

    /// Productive (in-frame) sequences are the only ones considered for matching
    #[must_use]
    pub fn is_in_frame(&self) -> bool {
        self.metadata.frame_type == FrameType::In
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.metadata.count
    }

    /// Flatten the sequence, its identifier and all metadata into a single map
    #[must_use]
    pub fn record(&self, sequence_type: SequenceType) -> SequenceRecord {
        use serde_json::Value;

        let mut record = SequenceRecord::new();
        let sequence = self.sequence(sequence_type).ok().map(str::to_string);
        record.insert("sequence".to_string(), sequence.map_or(Value::Null, Value::String));
        record.insert(
            "identifier".to_string(),
            Value::String(self.identifier.clone()),
        );

        let meta = &self.metadata;
        let optional = |v: &Option<String>| v.clone().map_or(Value::Null, Value::String);
        record.insert(
            "chain".to_string(),
            meta.chain
                .map_or(Value::Null, |c| Value::String(c.code().to_string())),
        );
        record.insert("v_gene".to_string(), optional(&meta.v_gene));
        record.insert("v_subgroup".to_string(), optional(&meta.v_subgroup));
        record.insert("v_allele".to_string(), optional(&meta.v_allele));
        record.insert("j_gene".to_string(), optional(&meta.j_gene));
        record.insert("j_subgroup".to_string(), optional(&meta.j_subgroup));
        record.insert("j_allele".to_string(), optional(&meta.j_allele));
        record.insert("count".to_string(), Value::from(meta.count));
        record.insert(
            "frame_type".to_string(),
            Value::String(meta.frame_type.to_string()),
        );
        record.insert(
            "region_type".to_string(),
            Value::String(meta.region_type.to_string()),
        );
        for (name, value) in &meta.custom {
            record
                .entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
        record
    }
}
