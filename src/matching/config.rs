use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{MetadataAttribute, SequenceType};
use crate::matching::MatchError;
use crate::utils::validation::{validate_max_edit_distance, validate_workers};

/// Default edit-distance budget
pub const DEFAULT_MAX_EDIT_DISTANCE: u32 = 1;

/// Default worker-pool size
pub const DEFAULT_WORKERS: usize = 4;

/// Which side of a match the per-sequence detail is reported from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchDirection {
    /// For each repertoire sequence, the reference sequences it matches
    #[default]
    #[value(name = "query")]
    QueryToReference,
    /// For each reference sequence, the repertoire sequences matching it
    #[value(name = "reference")]
    ReferenceToQuery,
}

impl std::fmt::Display for MatchDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueryToReference => write!(f, "query"),
            Self::ReferenceToQuery => write!(f, "reference"),
        }
    }
}

/// Parameters of a dataset-level match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Alphabet of the strings that are compared
    pub sequence_type: SequenceType,

    /// Strings of unequal length never match
    pub same_length_required: bool,

    /// Metadata attributes that must agree for two sequences to match
    pub metadata_attributes: Vec<MetadataAttribute>,

    pub max_edit_distance: u32,

    /// Size of the worker pool (one repertoire per unit of work)
    pub workers: usize,

    /// Keep per-sequence match lists in the results
    pub include_detail: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            sequence_type: SequenceType::AminoAcid,
            same_length_required: false,
            metadata_attributes: vec![
                MetadataAttribute::VGene,
                MetadataAttribute::JGene,
                MetadataAttribute::Chain,
            ],
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            workers: DEFAULT_WORKERS,
            include_detail: false,
        }
    }
}

impl MatchingConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Json` for malformed JSON or invalid field values (including
    /// negative distances), `MatchError::Config` if validation fails.
    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Io` if the file cannot be read, otherwise as [`Self::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, MatchError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Config` for zero workers or an unsupported edit distance.
    pub fn validate(&self) -> Result<(), MatchError> {
        validate_max_edit_distance(self.max_edit_distance)?;
        validate_workers(self.workers)?;
        Ok(())
    }

    #[must_use]
    pub fn with_sequence_type(mut self, sequence_type: SequenceType) -> Self {
        self.sequence_type = sequence_type;
        self
    }

    #[must_use]
    pub fn with_same_length_required(mut self, same_length_required: bool) -> Self {
        self.same_length_required = same_length_required;
        self
    }

    #[must_use]
    pub fn with_metadata_attributes(mut self, attributes: Vec<MetadataAttribute>) -> Self {
        self.metadata_attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_max_edit_distance(mut self, max_edit_distance: u32) -> Self {
        self.max_edit_distance = max_edit_distance;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_detail(mut self, include_detail: bool) -> Self {
        self.include_detail = include_detail;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::{ValidationError, MAX_EDIT_DISTANCE};

    #[test]
    fn test_default_config_is_valid() {
        let config = MatchingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_edit_distance, 1);
        assert_eq!(
            config.metadata_attributes,
            vec![
                MetadataAttribute::VGene,
                MetadataAttribute::JGene,
                MetadataAttribute::Chain
            ]
        );
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = MatchingConfig::default().with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(MatchError::Config(ValidationError::ZeroWorkers))
        ));
    }

    #[test]
    fn test_validate_rejects_large_distance() {
        let config = MatchingConfig::default().with_max_edit_distance(MAX_EDIT_DISTANCE + 1);
        assert!(matches!(
            config.validate(),
            Err(MatchError::Config(ValidationError::EditDistanceTooLarge(_)))
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = MatchingConfig::from_json(
            r#"{"max_edit_distance": 2, "metadata_attributes": ["chain"], "same_length_required": true}"#,
        )
        .unwrap();
        assert_eq!(config.max_edit_distance, 2);
        assert_eq!(config.metadata_attributes, vec![MetadataAttribute::Chain]);
        assert!(config.same_length_required);
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_from_json_rejects_negative_distance() {
        assert!(matches!(
            MatchingConfig::from_json(r#"{"max_edit_distance": -1}"#),
            Err(MatchError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_unknown_sequence_type() {
        assert!(MatchingConfig::from_json(r#"{"sequence_type": "protein"}"#).is_err());
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(MatchDirection::QueryToReference.to_string(), "query");
        assert_eq!(MatchDirection::ReferenceToQuery.to_string(), "reference");
    }
}
