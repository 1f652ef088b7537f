//! Dotted path helpers shared by the codec, walker, resolver, and store.

use crate::error::TransfigError;

pub const DELIM: char = '.';
pub const WILDCARD: &str = "*";

/// Join `key` onto `prefix` with the path delimiter, skipping it for an empty prefix.
pub fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{DELIM}{key}")
    }
}

pub fn split(key: &str) -> Vec<&str> {
    key.split(DELIM).collect()
}

pub fn join(parts: &[&str]) -> String {
    parts.join(".")
}

pub fn segment_count(key: &str) -> usize {
    key.split(DELIM).count()
}

/// Last segment of a dotted path (the whole path if it has no delimiter).
pub fn last_segment(key: &str) -> &str {
    key.rsplit(DELIM).next().unwrap_or(key)
}

/// A segment that parses as a non-negative integer addresses a sequence element.
pub fn as_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Check a store path at the API boundary: non-empty, no empty segments,
/// no wildcard.
pub fn validate_store_path(path: &str) -> Result<(), TransfigError> {
    let invalid = |reason: &str| TransfigError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    for segment in path.split(DELIM) {
        if segment.is_empty() {
            return Err(invalid("empty segment"));
        }
        if segment == WILDCARD {
            return Err(invalid("'*' is reserved for schema paths"));
        }
    }
    Ok(())
}
