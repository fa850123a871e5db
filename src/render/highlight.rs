//! Splitting rendered text into highlighted and plain segments.

use std::ops::Range;

use crate::search::{SearchEngine, SearchMatch, SearchText};

/// Part of a match that falls inside one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPiece {
    /// Byte range local to the fragment.
    pub range: Range<usize>,
    /// Index of the match this piece belongs to.
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Match { index: usize, active: bool },
}

/// A run of text with one highlight state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind,
}

/// Match pieces grouped by fragment, ready for a renderer to consume.
#[derive(Debug, Clone)]
pub struct Highlights<'a> {
    text: &'a SearchText,
    pieces: Vec<Vec<MatchPiece>>,
    active: Option<usize>,
}

impl<'a> Highlights<'a> {
    pub fn new(text: &'a SearchText, matches: &[SearchMatch], active: Option<usize>) -> Self {
        let mut pieces = vec![Vec::new(); text.fragments().len()];
        for m in matches {
            for (fragment, range) in text.split_range(m.anchor.range.clone()) {
                pieces[fragment].push(MatchPiece {
                    range,
                    index: m.index,
                });
            }
        }
        Self {
            text,
            pieces,
            active,
        }
    }

    /// Highlights of the engine's current pass.
    pub fn from_engine(engine: &'a SearchEngine) -> Self {
        Self::new(engine.content(), engine.matches(), engine.active_index())
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Pieces for the text of `span` in the block at pre-order index `block`.
    pub fn for_span(&self, block: usize, span: usize) -> &[MatchPiece] {
        self.text
            .fragment_of(block, span)
            .and_then(|f| self.pieces.get(f))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Segment a span's text.
    pub fn segment<'t>(&self, block: usize, span: usize, text: &'t str) -> Vec<Segment<'t>> {
        segment_text(text, self.for_span(block, span), self.active)
    }
}

/// Split `text` around the given match pieces.
///
/// Pieces must be sorted and non-overlapping, as produced by a single match
/// pass. Pieces that fall outside `text` or off a char boundary are ignored.
pub fn segment_text<'t>(
    text: &'t str,
    pieces: &[MatchPiece],
    active: Option<usize>,
) -> Vec<Segment<'t>> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for piece in pieces {
        let Range { start, end } = piece.range;
        if start < last_end
            || end > text.len()
            || start >= end
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            continue;
        }

        // Add text before match
        if start > last_end {
            segments.push(Segment {
                text: &text[last_end..start],
                kind: SegmentKind::Plain,
            });
        }

        segments.push(Segment {
            text: &text[start..end],
            kind: SegmentKind::Match {
                index: piece.index,
                active: active == Some(piece.index),
            },
        });
        last_end = end;
    }

    // Add remaining text after last match
    if last_end < text.len() || segments.is_empty() {
        segments.push(Segment {
            text: &text[last_end..],
            kind: SegmentKind::Plain,
        });
    }

    segments
}
