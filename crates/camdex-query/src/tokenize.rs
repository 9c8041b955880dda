//! Query tokenization and FTS5 match expression construction.

use camdex_core::{IndexError, Result, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};

/// Words dropped from queries before matching.
///
/// Function words plus the domain nouns nearly every query contains.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "by", "for", "from", "in", "into", "is", "near", "of", "on",
    "or", "the", "to", "with", "camera", "cameras",
];

/// Split a query into lowercase ASCII alphanumeric tokens.
///
/// Every other character, including non-ASCII letters, is a boundary.
pub fn split_tokens(query: &str) -> Vec<String> {
    let normalized: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();

    normalized.split_whitespace().map(str::to_string).collect()
}

/// Tokenize and drop stopwords.
///
/// A query made only of stopwords keeps its unfiltered tokens so it still
/// searches literally.
pub fn tokenize(query: &str) -> Vec<String> {
    let tokens = split_tokens(query);
    let filtered: Vec<String> = tokens
        .iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .cloned()
        .collect();

    if filtered.is_empty() {
        tokens
    } else {
        filtered
    }
}

/// Build the FTS5 expression: every token as a prefix term, all required.
///
/// Fails with [`IndexError::EmptyQuery`] when the query has no alphanumeric
/// content, instead of matching everything.
pub fn build_match_expression(query: &str) -> Result<String> {
    let terms: Vec<String> = tokenize(query)
        .into_iter()
        .map(|t| format!("{}*", t))
        .collect();

    if terms.is_empty() {
        return Err(IndexError::EmptyQuery);
    }

    Ok(terms.join(" AND "))
}

/// Clamp a requested result count to `1..=MAX_SEARCH_LIMIT`.
///
/// Zero or negative selects the default.
pub fn clamp_limit(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_SEARCH_LIMIT
    } else {
        (limit as u64).min(MAX_SEARCH_LIMIT as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_punctuation_and_unicode() {
        assert_eq!(
            split_tokens("North-Door_2 (Café)"),
            vec!["north", "door", "2", "caf"]
        );
        assert!(split_tokens("  ¿¡ --- !!").is_empty());
    }

    #[test]
    fn test_stopwords_removed() {
        assert_eq!(
            tokenize("find the camera near lobby"),
            vec!["find", "lobby"]
        );
    }

    #[test]
    fn test_only_stopwords_falls_back() {
        assert_eq!(tokenize("The Camera"), vec!["the", "camera"]);
    }

    #[test]
    fn test_match_expression() {
        assert_eq!(
            build_match_expression("Cathedral cameras").unwrap(),
            "cathedral*"
        );
        assert_eq!(
            build_match_expression("north door").unwrap(),
            "north* AND door*"
        );
    }

    #[test]
    fn test_empty_query() {
        for query in ["", "   ", "!!!", "¿?"] {
            let err = build_match_expression(query).unwrap_err();
            assert_eq!(err.error_code(), "EMPTY_QUERY");
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), DEFAULT_SEARCH_LIMIT);
        assert_eq!(clamp_limit(-3), DEFAULT_SEARCH_LIMIT);
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(75), 75);
        assert_eq!(clamp_limit(10_000), MAX_SEARCH_LIMIT);
    }
}
