//! Match computation and active-match navigation.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use super::pattern::{normalize_term, search_regex};
use super::text::{SearchText, TextPosition};

/// Where a match sits in the rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchAnchor {
    /// Byte range in the joined search text.
    pub range: Range<usize>,
    pub start: TextPosition,
    /// Exclusive end.
    pub end: TextPosition,
}

/// One located occurrence of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    /// 0-based, contiguous, valid for one search pass only.
    pub index: usize,
    pub anchor: MatchAnchor,
}

/// Find every non-overlapping occurrence of `term` in `text`, in document
/// order. Matches may span several fragments.
///
/// ```
/// use blockpress::search::{compute_matches, SearchText};
///
/// let text = SearchText::from_plain("the cat sat on the mat");
/// let matches = compute_matches(&text, "the");
/// assert_eq!(matches.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 1]);
/// ```
pub fn compute_matches(text: &SearchText, term: &str) -> Vec<SearchMatch> {
    let Some(re) = search_regex(&normalize_term(term)) else {
        return Vec::new();
    };

    re.find_iter(text.as_str())
        .filter(|m| !m.is_empty())
        .filter_map(|m| {
            Some(MatchAnchor {
                range: m.range(),
                start: text.locate(m.start())?,
                end: text.locate_end(m.end())?,
            })
        })
        .enumerate()
        .map(|(index, anchor)| SearchMatch { index, anchor })
        .collect()
}

/// Engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No query.
    Idle,
    /// Query set and matches computed.
    Searching,
}

/// `current/total` counter shown next to a search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStatus {
    pub active: Option<usize>,
    pub total: usize,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active {
            Some(active) if self.total > 0 => write!(f, "{}/{}", active + 1, self.total),
            _ => write!(f, "0/0"),
        }
    }
}

type ActiveListener = Box<dyn FnMut(Option<&SearchMatch>)>;

/// In-document search session for one document view.
///
/// Holds the current query, the matches of the last pass and the active
/// match. The engine only reports which match is active; scrolling or
/// focusing it is up to whoever listens through [`SearchEngine::on_active_change`].
pub struct SearchEngine {
    content: SearchText,
    query: String,
    matches: Vec<SearchMatch>,
    active: Option<usize>,
    listener: Option<ActiveListener>,
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("query", &self.query)
            .field("matches", &self.matches.len())
            .field("active", &self.active)
            .finish()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchText::default())
    }
}

impl SearchEngine {
    pub fn new(content: SearchText) -> Self {
        Self {
            content,
            query: String::new(),
            matches: Vec::new(),
            active: None,
            listener: None,
        }
    }

    /// Register the callback invoked whenever the active match changes,
    /// including resets caused by a new query or new content.
    pub fn on_active_change(&mut self, listener: impl FnMut(Option<&SearchMatch>) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> SearchState {
        if self.query.is_empty() {
            SearchState::Idle
        } else {
            SearchState::Searching
        }
    }

    /// The normalized query.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn content(&self) -> &SearchText {
        &self.content
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_match(&self) -> Option<&SearchMatch> {
        self.active.and_then(|i| self.matches.get(i))
    }

    pub fn status(&self) -> MatchStatus {
        MatchStatus {
            active: self.active,
            total: self.matches.len(),
        }
    }

    /// Set the query and recompute. An empty query returns to idle.
    ///
    /// Returns the number of matches.
    pub fn set_query(&mut self, term: &str) -> usize {
        self.query = normalize_term(term);
        self.recompute();
        self.matches.len()
    }

    /// Drop the query and all matches.
    pub fn clear(&mut self) {
        self.set_query("");
    }

    /// Replace the document text. An active query is re-run from scratch and
    /// the active match resets to the first one.
    pub fn set_content(&mut self, content: SearchText) {
        self.content = content;
        if self.state() == SearchState::Searching {
            self.recompute();
        }
    }

    /// Full match pass over the current content.
    pub fn recompute(&mut self) {
        self.matches = if self.query.is_empty() {
            Vec::new()
        } else {
            compute_matches(&self.content, &self.query)
        };
        tracing::trace!(query = %self.query, matches = self.matches.len(), "search recomputed");

        self.active = if self.matches.is_empty() { None } else { Some(0) };
        self.notify();
    }

    /// Move to the next match, wrapping around. No-op with fewer than two
    /// matches. Returns the active index after the call.
    pub fn next(&mut self) -> Option<usize> {
        self.step(1)
    }

    /// Move to the previous match, wrapping around. No-op with fewer than
    /// two matches. Returns the active index after the call.
    pub fn previous(&mut self) -> Option<usize> {
        let count = self.matches.len();
        self.step(count.saturating_sub(1))
    }

    /// Make match `index` active, wrapping past the end. No-op without
    /// matches.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let index = index % count;
        if self.active != Some(index) {
            self.active = Some(index);
            self.notify();
        }
        self.active
    }

    fn step(&mut self, by: usize) -> Option<usize> {
        let count = self.matches.len();
        if count <= 1 {
            return self.active;
        }
        let current = self.active.unwrap_or(0);
        self.active = Some((current + by) % count);
        self.notify();
        self.active
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            let active = self.active.and_then(|i| self.matches.get(i));
            listener(active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(text: &str) -> SearchEngine {
        SearchEngine::new(SearchText::from_plain(text))
    }

    #[test]
    fn test_match_indexing_and_wraparound() {
        let mut engine = engine("the cat sat on the mat");
        assert_eq!(engine.set_query("the"), 2);
        assert_eq!(
            engine.matches().iter().map(|m| m.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(engine.matches()[1].anchor.range, 15..18);
        assert_eq!(engine.active_index(), Some(0));
        assert_eq!(engine.next(), Some(1));
        assert_eq!(engine.next(), Some(0));
        assert_eq!(engine.previous(), Some(1));
        assert_eq!(engine.status().to_string(), "2/2");
    }

    #[test]
    fn test_case_insensitive_non_overlapping() {
        let mut engine = engine("AAAA aa");
        assert_eq!(engine.set_query("aa"), 3);
    }

    #[test]
    fn test_whitespace_tolerant_query() {
        let mut engine = engine("the cat   \n  sat, then a cat sat");
        assert_eq!(engine.set_query("  cat    sat "), 2);
        assert_eq!(engine.query(), "cat sat");
    }

    #[test]
    fn test_empty_query_is_idle() {
        let mut engine = engine("anything");
        assert_eq!(engine.set_query("   "), 0);
        assert_eq!(engine.state(), SearchState::Idle);
        assert_eq!(engine.active_index(), None);
        assert_eq!(engine.status().to_string(), "0/0");
    }

    #[test]
    fn test_navigation_noop_without_matches() {
        let mut engine = engine("one match only");
        assert_eq!(engine.next(), None);
        engine.set_query("match");
        assert_eq!(engine.match_count(), 1);
        assert_eq!(engine.next(), Some(0));
        assert_eq!(engine.previous(), Some(0));

        engine.set_query("absent");
        assert_eq!(engine.next(), None);
        assert_eq!(engine.status().to_string(), "0/0");
    }

    #[test]
    fn test_content_change_resets_active() {
        let mut engine = engine("a b a b a");
        engine.set_query("a");
        engine.next();
        engine.next();
        assert_eq!(engine.active_index(), Some(2));

        engine.set_content(SearchText::from_plain("a a"));
        assert_eq!(engine.match_count(), 2);
        assert_eq!(engine.active_index(), Some(0));
    }

    #[test]
    fn test_content_change_while_idle_stays_idle() {
        let mut engine = engine("a");
        engine.set_content(SearchText::from_plain("a a a"));
        assert_eq!(engine.match_count(), 0);
        assert_eq!(engine.state(), SearchState::Idle);
    }

    #[test]
    fn test_match_across_fragments() {
        let text = SearchText::from_fragments(&[vec!["the c", "at"], vec!["sat here"]]);
        let matches = compute_matches(&text, "cat sat");
        assert_eq!(matches.len(), 1);
        let anchor = &matches[0].anchor;
        assert_eq!(
            anchor.start,
            TextPosition {
                fragment: 0,
                offset: 4
            }
        );
        assert_eq!(
            anchor.end,
            TextPosition {
                fragment: 2,
                offset: 3
            }
        );
    }

    #[test]
    fn test_listener_sees_active_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut engine = engine("x y x y x");
        engine.on_active_change(move |m| sink.borrow_mut().push(m.map(|m| m.index)));

        engine.set_query("x");
        engine.next();
        engine.previous();
        engine.previous();
        engine.clear();

        assert_eq!(
            *seen.borrow(),
            vec![Some(0), Some(1), Some(0), Some(2), None]
        );
    }

    #[test]
    fn test_select_wraps() {
        let mut engine = engine("a a a");
        assert_eq!(engine.select(1), None);
        engine.set_query("a");
        assert_eq!(engine.select(2), Some(2));
        assert_eq!(engine.select(4), Some(1));
        assert_eq!(engine.status().to_string(), "2/3");
    }

    #[test]
    fn test_long_query_is_matched_in_full() {
        let text = format!("{}b", "a".repeat(256));
        let mut engine = engine(&text);
        let long = "a".repeat(300);
        assert_eq!(engine.set_query(&long), 0);
        assert_eq!(engine.query().len(), 300);

        assert_eq!(engine.set_query(&"a".repeat(256)), 1);
    }
}
