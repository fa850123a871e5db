//! In-document search with stable match numbering.
//!
//! Matching runs against the logical text of a rendered document
//! ([`SearchText`]), not against individual spans, so a query still matches
//! when bold or italic markup splits a word. [`compute_matches`] is the pure
//! matching step; [`SearchEngine`] adds the per-view state: current query,
//! last match set and the active match with wraparound navigation.

mod engine;
mod pattern;
mod text;

pub use engine::{
    MatchAnchor, MatchStatus, SearchEngine, SearchMatch, SearchState,
    compute_matches,
};
pub use pattern::{normalize_term, search_pattern, search_regex};
pub use text::{Fragment, SearchText, TextPosition};
