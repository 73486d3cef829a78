use super::address::parse_candidate;
use crate::models::Candidate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Coarse shape of an IPv4 literal with an optional port; bounds are checked by the parser
static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}(?::\d{1,5})?\b").expect("address pattern is valid")
});

/// Collect every distinct candidate found in free-form text
pub fn extract_candidates(text: &str) -> HashSet<Candidate> {
    let mut candidates = HashSet::new();

    for token in ADDRESS_PATTERN.find_iter(text) {
        match parse_candidate(token.as_str()) {
            Ok(candidate) => {
                candidates.insert(candidate);
            }
            Err(e) => tracing::trace!("Dropping token: {}", e),
        }
    }

    candidates
}
