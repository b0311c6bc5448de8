//! Approximate string index for near-duplicate sequence lookup.
//!
//! Matching and network construction both need to answer "which indexed strings are
//! within Levenshtein distance `d` of this query" for tens of thousands of short
//! strings. Comparing every pair is quadratic, so queries go through a
//! deletion-neighbourhood index instead:
//!
//! 1. **Build**: every indexed string is expanded into all strings reachable by
//!    deleting up to `max_distance` characters, and each variant maps back to the
//!    strings that produced it.
//! 2. **Lookup**: the query is expanded the same way (up to the query distance);
//!    any indexed string sharing a variant with the query is a candidate.
//! 3. **Verify**: candidates are checked with an exact banded edit-distance
//!    computation, so the result contains no false positives.
//!
//! Two strings within edit distance `d` always share a variant obtained by at most
//! `d` deletions from each side, so the candidate step never misses a true match.
//! Lookup cost depends on the query length and the number of candidates, not on the
//! size of the index.
//!
//! ## Example
//!
//! ```rust
//! use repmatch::index::DeletionIndex;
//!
//! let index = DeletionIndex::build(["CASSLGQ", "CASSLGE", "CAWSVGQ"], 1);
//! let hits = index.lookup("CASSLGQ", 1).unwrap();
//! assert_eq!(hits, vec!["CASSLGQ", "CASSLGE"]);
//! ```

pub mod deletion;
pub mod distance;

pub use deletion::{DeletionIndex, IndexError};
pub use distance::{edit_distance, within_edit_distance};
