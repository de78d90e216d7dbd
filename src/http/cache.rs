//! HTTP cache validation module
//!
//! `ETag` generation and `If-None-Match` evaluation for conditional
//! requests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute the `ETag` for a response body.
///
/// Returns a quoted hex digest, stable for identical bytes across
/// requests.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let digest = hasher.finish();
    format!("\"{digest:x}\"")
}

/// Evaluate the client's `If-None-Match` header against the computed
/// `ETag`.
///
/// Handles a single tag, a comma-separated list, and the `*` wildcard.
/// Returns true when the client's copy is current and a 304 applies.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|candidate| candidate.trim() == etag || candidate.trim() == "*")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(b"hello world");
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(etag.len() > 2);
    }

    #[test]
    fn test_etag_stable_for_same_content() {
        assert_eq!(generate_etag(b"same content"), generate_etag(b"same content"));
    }

    #[test]
    fn test_etag_differs_for_different_content() {
        assert_ne!(generate_etag(b"content a"), generate_etag(b"content b"));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }
}
