//! Centralized validation and helper functions.

/// Maximum number of distinct symptoms accepted in a single query
pub const MAX_QUERY_SYMPTOMS: usize = 256;

/// Maximum identifier length accepted from a catalog or a query
pub const MAX_IDENTIFIER_LENGTH: usize = 200;

/// Convert a count to f64 for ratio calculations.
///
/// Catalog sizes are far below the range where f64 loses integer precision.
#[inline]
#[must_use]
pub fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Check that a string can serve as a catalog identifier.
///
/// Identifiers must be non-blank, at most [`MAX_IDENTIFIER_LENGTH`] bytes, and
/// free of control characters.
///
/// # Examples
///
/// ```
/// use dx_solver::utils::validation::is_valid_identifier;
///
/// assert!(is_valid_identifier("Shortness of Breath"));
/// assert!(is_valid_identifier("Chronic Obstructive Pulmonary Disease (COPD)"));
/// assert!(!is_valid_identifier("   "));
/// assert!(!is_valid_identifier("Fever\n"));
/// ```
#[must_use]
pub fn is_valid_identifier(s: &str) -> bool {
    !s.trim().is_empty() && s.len() <= MAX_IDENTIFIER_LENGTH && !s.chars().any(char::is_control)
}

/// Check whether a query of `count` distinct symptoms is within limits.
///
/// Returns an error message if the query is too large, None if it is acceptable.
#[must_use]
pub fn check_query_limit(count: usize) -> Option<String> {
    if count > MAX_QUERY_SYMPTOMS {
        Some(format!(
            "Too many symptoms: {count} reported, maximum is {MAX_QUERY_SYMPTOMS}"
        ))
    } else {
        None
    }
}
