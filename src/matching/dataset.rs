use rayon::prelude::*;
use std::time::Instant;
use tracing::info;

use crate::core::{ReceptorSequence, Repertoire, RepertoireDataset};
use crate::matching::config::{MatchDirection, MatchingConfig};
use crate::matching::engine::RepertoireMatcher;
use crate::matching::projection::hash_sequences;
use crate::matching::result::DatasetMatchResult;
use crate::matching::MatchError;

/// Runs the repertoire matcher over every repertoire of a dataset on a bounded
/// worker pool.
#[derive(Debug, Clone)]
pub struct DatasetMatcher {
    config: MatchingConfig,
}

impl DatasetMatcher {
    /// # Errors
    ///
    /// Returns `MatchError::Config` if the configuration is invalid.
    pub fn new(config: MatchingConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Match every repertoire against `references`.
    ///
    /// References are projected once and shared read-only by all workers. Each
    /// repertoire is loaded, matched and released by a single worker. Results are in
    /// input order regardless of completion order; any repertoire failure fails the
    /// whole call.
    ///
    /// # Errors
    ///
    /// Fails if a reference cannot be projected, the worker pool cannot be built, or
    /// any repertoire fails to load or match.
    pub fn match_dataset<R: Repertoire>(
        &self,
        dataset: &RepertoireDataset<R>,
        references: Vec<ReceptorSequence>,
        direction: MatchDirection,
    ) -> Result<DatasetMatchResult, MatchError> {
        let start = Instant::now();

        let hashed_references = hash_sequences(
            &references,
            &self.config.metadata_attributes,
            self.config.sequence_type,
        )?;
        let matcher = RepertoireMatcher::new(&hashed_references, &self.config);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()?;
        let repertoires = pool.install(|| {
            dataset
                .repertoires()
                .par_iter()
                .enumerate()
                .map(|(index, repertoire)| matcher.match_repertoire(index, repertoire, direction))
                .collect::<Result<Vec<_>, _>>()
        })?;

        info!(
            repertoires = repertoires.len(),
            references = references.len(),
            workers = self.config.workers,
            "Matched dataset in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        Ok(DatasetMatchResult {
            direction,
            repertoires,
            reference_sequences: references,
        })
    }

    /// [`Self::match_dataset`] reporting, per repertoire sequence, the matching references
    ///
    /// # Errors
    ///
    /// As [`Self::match_dataset`].
    pub fn match_query_to_reference<R: Repertoire>(
        &self,
        dataset: &RepertoireDataset<R>,
        references: Vec<ReceptorSequence>,
    ) -> Result<DatasetMatchResult, MatchError> {
        self.match_dataset(dataset, references, MatchDirection::QueryToReference)
    }

    /// [`Self::match_dataset`] reporting, per reference, the matching repertoire sequences
    ///
    /// # Errors
    ///
    /// As [`Self::match_dataset`].
    pub fn match_reference_to_query<R: Repertoire>(
        &self,
        dataset: &RepertoireDataset<R>,
        references: Vec<ReceptorSequence>,
    ) -> Result<DatasetMatchResult, MatchError> {
        self.match_dataset(dataset, references, MatchDirection::ReferenceToQuery)
    }
}
