use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::sequence::ReceptorSequence;

/// Repertoire-level labels (e.g. disease status, subject id)
pub type RepertoireMetadata = BTreeMap<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum RepertoireError {
    #[error("Failed to load repertoire '{identifier}': {source}")]
    Load {
        identifier: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A collection of receptor sequences from one sample.
///
/// Sequences are loaded on demand so a dataset can describe more repertoires than fit
/// in memory at once; each unit of work loads, processes and drops its repertoire.
pub trait Repertoire: Send + Sync {
    fn identifier(&self) -> &str;

    /// File the sequences come from, if any
    fn filename(&self) -> Option<&Path>;

    fn metadata(&self) -> &RepertoireMetadata;

    /// Load all sequences in their stored order
    ///
    /// # Errors
    ///
    /// Returns `RepertoireError::Load` if the backing data cannot be read.
    fn load_sequences(&self) -> Result<Vec<ReceptorSequence>, RepertoireError>;
}

/// A repertoire whose sequences are already held in memory
#[derive(Debug, Clone)]
pub struct InMemoryRepertoire {
    identifier: String,
    filename: Option<PathBuf>,
    metadata: RepertoireMetadata,
    sequences: Vec<ReceptorSequence>,
}

impl InMemoryRepertoire {
    pub fn new(identifier: impl Into<String>, sequences: Vec<ReceptorSequence>) -> Self {
        Self {
            identifier: identifier.into(),
            filename: None,
            metadata: RepertoireMetadata::new(),
            sequences,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn sequences(&self) -> &[ReceptorSequence] {
        &self.sequences
    }
}

impl Repertoire for InMemoryRepertoire {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    fn metadata(&self) -> &RepertoireMetadata {
        &self.metadata
    }

    fn load_sequences(&self) -> Result<Vec<ReceptorSequence>, RepertoireError> {
        Ok(self.sequences.clone())
    }
}

/// Ordered collection of repertoires
#[derive(Debug, Clone)]
pub struct RepertoireDataset<R> {
    repertoires: Vec<R>,
}

impl<R: Repertoire> RepertoireDataset<R> {
    #[must_use]
    pub fn new(repertoires: Vec<R>) -> Self {
        Self { repertoires }
    }

    #[must_use]
    pub fn repertoires(&self) -> &[R] {
        &self.repertoires
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.repertoires.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.repertoires.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repertoires.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_repertoire() {
        let repertoire = InMemoryRepertoire::new(
            "rep1",
            vec![
                ReceptorSequence::new("1", "CASSF"),
                ReceptorSequence::new("2", "CASSY"),
            ],
        )
        .with_filename("rep1.tsv")
        .with_label("CD", true);

        assert_eq!(repertoire.identifier(), "rep1");
        assert_eq!(repertoire.filename(), Some(Path::new("rep1.tsv")));
        assert_eq!(repertoire.metadata()["CD"], serde_json::Value::Bool(true));
        assert_eq!(repertoire.load_sequences().unwrap().len(), 2);
    }

    #[test]
    fn test_dataset_preserves_order() {
        let dataset = RepertoireDataset::new(vec![
            InMemoryRepertoire::new("a", vec![]),
            InMemoryRepertoire::new("b", vec![]),
        ]);
        let ids: Vec<&str> = dataset.iter().map(Repertoire::identifier).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());
    }
}
