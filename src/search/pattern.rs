//! Query normalization and search pattern construction.

use regex::{Regex, RegexBuilder};

/// Trim a query and collapse its internal whitespace runs to single spaces.
///
/// ```
/// use blockpress::search::normalize_term;
///
/// assert_eq!(normalize_term("  cat \n\t sat "), "cat sat");
/// ```
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Regex source for a query: metacharacters escaped, whitespace runs relaxed
/// to `\s+` so multi-word queries match across line wraps. Empty for an
/// empty query.
pub fn search_pattern(term: &str) -> String {
    term.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// Case-insensitive regex for a query, or `None` when the query is empty.
pub fn search_regex(term: &str) -> Option<Regex> {
    let pattern = search_pattern(term);
    if pattern.is_empty() {
        return None;
    }

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            // escaped input always compiles; a pathological size limit is the only way here
            tracing::warn!(error = %e, "search pattern rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_term() {
        assert_eq!(normalize_term(""), "");
        assert_eq!(normalize_term("   "), "");
        assert_eq!(normalize_term("cat"), "cat");
        assert_eq!(normalize_term(" the   cat\nsat "), "the cat sat");
    }

    #[test]
    fn test_pattern_escapes_metacharacters() {
        assert_eq!(search_pattern("a.b"), r"a\.b");
        assert_eq!(search_pattern("(1+1)"), r"\(1\+1\)");
        assert_eq!(search_pattern("cat  sat"), r"cat\s+sat");
        assert_eq!(search_pattern(" "), "");
    }

    #[test]
    fn test_regex_is_case_insensitive() {
        let re = search_regex("Cat Sat").unwrap();
        assert!(re.is_match("the CAT\n  sat down"));
        assert!(!re.is_match("catsat"));
        assert!(search_regex("").is_none());
    }

    #[test]
    fn test_regex_literal_metacharacters() {
        let re = search_regex("$5.00?").unwrap();
        assert!(re.is_match("costs $5.00? maybe"));
        assert!(!re.is_match("costs 5100"));
    }
}
