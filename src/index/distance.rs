//! Edit-distance primitives backed by `triple_accel`.

use triple_accel::levenshtein::{levenshtein, levenshtein_simd_k};

/// Levenshtein distance between two byte strings
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> u32 {
    levenshtein(a.as_bytes(), b.as_bytes())
}

/// Whether `a` and `b` are within `max_distance` edits of each other.
///
/// Uses the banded SIMD implementation, which stops as soon as the band is exceeded.
#[must_use]
pub fn within_edit_distance(a: &str, b: &str, max_distance: u32) -> bool {
    if a.len().abs_diff(b.len()) > max_distance as usize {
        return false;
    }
    if max_distance == 0 {
        return a == b;
    }
    if a.is_empty() || b.is_empty() {
        return true;
    }
    levenshtein_simd_k(a.as_bytes(), b.as_bytes(), max_distance).is_some()
}
