use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::index::distance::within_edit_distance;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("Query distance {requested} exceeds the distance the index was built for ({built})")]
    DistanceExceedsIndex { requested: u32, built: u32 },
}

/// Deletion-neighbourhood index over a set of distinct strings
#[derive(Debug, Clone)]
pub struct DeletionIndex {
    /// Indexed strings, in first-seen order
    strings: Vec<String>,

    /// Largest query distance this index can answer
    max_distance: u32,

    /// Index: deletion variant -> ids of strings producing it (ascending)
    neighborhoods: HashMap<Vec<u8>, Vec<u32>>,
}

impl DeletionIndex {
    /// Build an index answering queries up to `max_distance`.
    ///
    /// Duplicate input strings are indexed once, so every lookup reports a string at
    /// most once.
    pub fn build<I, S>(strings: I, max_distance: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut distinct = Vec::new();
        for s in strings {
            let s = s.into();
            if seen.insert(s.clone()) {
                distinct.push(s);
            }
        }

        let mut neighborhoods: HashMap<Vec<u8>, Vec<u32>> = HashMap::new();
        for (id, s) in distinct.iter().enumerate() {
            let id = u32::try_from(id).unwrap_or(u32::MAX);
            for variant in deletion_neighborhood(s.as_bytes(), max_distance) {
                neighborhoods.entry(variant).or_default().push(id);
            }
        }

        tracing::debug!(
            strings = distinct.len(),
            variants = neighborhoods.len(),
            max_distance,
            "Built deletion index"
        );

        Self {
            strings: distinct,
            max_distance,
            neighborhoods,
        }
    }

    /// All indexed strings within `max_distance` edits of `query`, in index order.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DistanceExceedsIndex` if `max_distance` is larger than the
    /// distance the index was built for.
    pub fn lookup(&self, query: &str, max_distance: u32) -> Result<Vec<&str>, IndexError> {
        if max_distance > self.max_distance {
            return Err(IndexError::DistanceExceedsIndex {
                requested: max_distance,
                built: self.max_distance,
            });
        }
        if self.strings.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<u32> = deletion_neighborhood(query.as_bytes(), max_distance)
            .iter()
            .filter_map(|variant| self.neighborhoods.get(variant))
            .flatten()
            .copied()
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        Ok(candidates
            .into_iter()
            .map(|id| self.strings[id as usize].as_str())
            .filter(|candidate| within_edit_distance(query, candidate, max_distance))
            .collect())
    }

    /// Number of distinct indexed strings
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[must_use]
    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    /// The indexed strings in index order
    #[must_use]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }
}

/// All byte strings reachable from `s` by deleting at most `max_deletions` bytes,
/// including `s` itself.
fn deletion_neighborhood(s: &[u8], max_deletions: u32) -> HashSet<Vec<u8>> {
    let mut all: HashSet<Vec<u8>> = HashSet::new();
    all.insert(s.to_vec());

    let mut frontier: Vec<Vec<u8>> = vec![s.to_vec()];
    for _ in 0..max_deletions {
        let mut next = Vec::new();
        for variant in &frontier {
            for i in 0..variant.len() {
                let mut shorter = variant.clone();
                shorter.remove(i);
                if all.insert(shorter.clone()) {
                    next.push(shorter);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    all
}
