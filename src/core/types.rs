use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::sequence::SequenceError;

/// Receptor chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "A")]
    Alpha,
    #[serde(rename = "B")]
    Beta,
    #[serde(rename = "G")]
    Gamma,
    #[serde(rename = "D")]
    Delta,
    #[serde(rename = "H")]
    Heavy,
    #[serde(rename = "K")]
    Kappa,
    /// Lambda light chain
    #[serde(rename = "L")]
    Light,
}

impl Chain {
    /// Single-letter code used in tabular output
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Alpha => "A",
            Self::Beta => "B",
            Self::Gamma => "G",
            Self::Delta => "D",
            Self::Heavy => "H",
            Self::Kappa => "K",
            Self::Light => "L",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Chain {
    type Err = SequenceError;

    /// Accepts single-letter codes, IMGT locus names and full names, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" | "TRA" | "ALPHA" => Ok(Self::Alpha),
            "B" | "TRB" | "BETA" => Ok(Self::Beta),
            "G" | "TRG" | "GAMMA" => Ok(Self::Gamma),
            "D" | "TRD" | "DELTA" => Ok(Self::Delta),
            "H" | "IGH" | "HEAVY" => Ok(Self::Heavy),
            "K" | "IGK" | "KAPPA" => Ok(Self::Kappa),
            "L" | "IGL" | "LIGHT" | "LAMBDA" => Ok(Self::Light),
            _ => Err(SequenceError::InvalidValue {
                kind: "chain",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether a rearrangement is productive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameType {
    /// In-frame, translatable (productive)
    #[default]
    In,
    /// Out of frame
    Out,
    /// Contains a stop codon
    Stop,
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Stop => write!(f, "STOP"),
        }
    }
}

impl FromStr for FrameType {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "STOP" => Ok(Self::Stop),
            _ => Err(SequenceError::InvalidValue {
                kind: "frame type",
                value: s.to_string(),
            }),
        }
    }
}

/// Which part of the receptor the sequence string covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionType {
    #[default]
    Cdr3,
    FullSequence,
}

impl std::fmt::Display for RegionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cdr3 => write!(f, "CDR3"),
            Self::FullSequence => write!(f, "FULL_SEQUENCE"),
        }
    }
}

impl FromStr for RegionType {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CDR3" | "IMGT_CDR3" => Ok(Self::Cdr3),
            "FULL_SEQUENCE" | "FULL" => Ok(Self::FullSequence),
            _ => Err(SequenceError::InvalidValue {
                kind: "region type",
                value: s.to_string(),
            }),
        }
    }
}

/// Alphabet of the sequence string used for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    #[default]
    AminoAcid,
    Nucleotide,
}

impl std::fmt::Display for SequenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AminoAcid => write!(f, "amino acid"),
            Self::Nucleotide => write!(f, "nucleotide"),
        }
    }
}

impl FromStr for SequenceType {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amino_acid" | "aa" => Ok(Self::AminoAcid),
            "nucleotide" | "nt" => Ok(Self::Nucleotide),
            _ => Err(SequenceError::InvalidValue {
                kind: "sequence type",
                value: s.to_string(),
            }),
        }
    }
}

/// Selector for one metadata field of a [`ReceptorSequence`](crate::core::ReceptorSequence).
///
/// Standard field names map to dedicated variants; any other name selects a custom
/// attribute and fails at lookup time if the sequence does not carry it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetadataAttribute {
    Chain,
    VGene,
    VSubgroup,
    VAllele,
    JGene,
    JSubgroup,
    JAllele,
    Count,
    FrameType,
    RegionType,
    Custom(String),
}

impl MetadataAttribute {
    /// The attribute name as used in configuration and tabular input
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Chain => "chain",
            Self::VGene => "v_gene",
            Self::VSubgroup => "v_subgroup",
            Self::VAllele => "v_allele",
            Self::JGene => "j_gene",
            Self::JSubgroup => "j_subgroup",
            Self::JAllele => "j_allele",
            Self::Count => "count",
            Self::FrameType => "frame_type",
            Self::RegionType => "region_type",
            Self::Custom(name) => name,
        }
    }

    /// Parse a comma-separated attribute list such as `v_gene,j_gene,chain`
    #[must_use]
    pub fn parse_list(s: &str) -> Vec<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Self::from)
            .collect()
    }
}

impl From<&str> for MetadataAttribute {
    fn from(name: &str) -> Self {
        match name {
            "chain" => Self::Chain,
            "v_gene" => Self::VGene,
            "v_subgroup" => Self::VSubgroup,
            "v_allele" => Self::VAllele,
            "j_gene" => Self::JGene,
            "j_subgroup" => Self::JSubgroup,
            "j_allele" => Self::JAllele,
            "count" => Self::Count,
            "frame_type" => Self::FrameType,
            "region_type" => Self::RegionType,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for MetadataAttribute {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<MetadataAttribute> for String {
    fn from(attribute: MetadataAttribute) -> Self {
        attribute.name().to_string()
    }
}

impl std::fmt::Display for MetadataAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
