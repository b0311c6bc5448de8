//! Centralized validation and helper functions.

/// Largest edit distance accepted for matching and network construction.
///
/// The deletion-neighbourhood index grows combinatorially with the distance, so
/// values beyond this are rejected rather than attempted.
pub const MAX_EDIT_DISTANCE: u32 = 4;

/// Maximum number of sequences allowed in a single repertoire or reference file
pub const MAX_SEQUENCES_PER_FILE: usize = 5_000_000;

/// Separator placed between hashed fields; cannot occur in sequence or gene strings
const FIELD_SEPARATOR: u8 = 0x1f;

/// Parameter validation error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Max edit distance {0} exceeds the supported maximum of {MAX_EDIT_DISTANCE}")]
    EditDistanceTooLarge(u32),
    #[error("Worker count must be at least 1")]
    ZeroWorkers,
}

/// Validate a maximum edit distance parameter.
///
/// # Errors
///
/// Returns `ValidationError::EditDistanceTooLarge` if `distance > MAX_EDIT_DISTANCE`.
pub fn validate_max_edit_distance(distance: u32) -> Result<u32, ValidationError> {
    if distance > MAX_EDIT_DISTANCE {
        Err(ValidationError::EditDistanceTooLarge(distance))
    } else {
        Ok(distance)
    }
}

/// Validate a worker-pool size.
///
/// # Errors
///
/// Returns `ValidationError::ZeroWorkers` if `workers == 0`.
pub fn validate_workers(workers: usize) -> Result<usize, ValidationError> {
    if workers == 0 {
        Err(ValidationError::ZeroWorkers)
    } else {
        Ok(workers)
    }
}

/// Check if adding another sequence would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new sequence.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_sequence_limit(count: usize) -> Option<String> {
    if count >= MAX_SEQUENCES_PER_FILE {
        Some(format!(
            "Too many sequences: adding another would exceed maximum of {MAX_SEQUENCES_PER_FILE}"
        ))
    } else {
        None
    }
}

/// Compute a stable 64-bit hash of an ordered list of optional fields.
///
/// The hash is the first 8 bytes of the MD5 digest of the fields joined by a
/// separator byte, with absent fields encoded distinctly from empty strings. It does
/// not depend on process state, so it is identical across runs and worker threads.
///
/// # Examples
///
/// ```
/// use repmatch::utils::validation::stable_hash;
///
/// let a = stable_hash(&[Some("TRBV5-1"), None]);
/// assert_eq!(a, stable_hash(&[Some("TRBV5-1"), None]));
/// assert_ne!(a, stable_hash(&[Some("TRBV5-1"), Some("")]));
/// ```
#[must_use]
pub fn stable_hash(fields: &[Option<&str>]) -> u64 {
    let mut buffer = Vec::new();
    for field in fields {
        match field {
            Some(value) => {
                buffer.push(b'+');
                buffer.extend_from_slice(value.as_bytes());
            }
            None => buffer.push(b'-'),
        }
        buffer.push(FIELD_SEPARATOR);
    }
    let digest = md5::compute(&buffer);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.0[..8]);
    u64::from_be_bytes(prefix)
}

/// Convert a count to f64 for percentage calculations
#[inline]
#[must_use]
pub fn count_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// `numerator / denominator`, defined as 0 when the denominator is 0
#[must_use]
pub fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count_to_f64(numerator) / count_to_f64(denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_max_edit_distance() {
        assert_eq!(validate_max_edit_distance(0), Ok(0));
        assert_eq!(validate_max_edit_distance(MAX_EDIT_DISTANCE), Ok(MAX_EDIT_DISTANCE));
        assert_eq!(
            validate_max_edit_distance(MAX_EDIT_DISTANCE + 1),
            Err(ValidationError::EditDistanceTooLarge(MAX_EDIT_DISTANCE + 1))
        );
    }

    #[test]
    fn test_validate_workers() {
        assert_eq!(validate_workers(1), Ok(1));
        assert_eq!(validate_workers(0), Err(ValidationError::ZeroWorkers));
    }

    #[test]
    fn test_check_sequence_limit() {
        assert!(check_sequence_limit(0).is_none());
        assert!(check_sequence_limit(MAX_SEQUENCES_PER_FILE - 1).is_none());
        assert!(check_sequence_limit(MAX_SEQUENCES_PER_FILE).is_some());
    }

    #[test]
    fn test_stable_hash_field_boundaries() {
        // Moving characters across a field boundary must change the hash
        assert_ne!(
            stable_hash(&[Some("AB"), Some("C")]),
            stable_hash(&[Some("A"), Some("BC")])
        );
        assert_ne!(stable_hash(&[None]), stable_hash(&[Some("")]));
        assert_ne!(stable_hash(&[]), stable_hash(&[None]));
    }

    #[test]
    fn test_safe_ratio() {
        assert!((safe_ratio(8, 10) - 0.8).abs() < 1e-12);
        assert!((safe_ratio(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!(!safe_ratio(5, 0).is_nan());
    }
}
