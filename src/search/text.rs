//! Searchable text of a rendered document.
//!
//! A [`SearchText`] is the logical concatenation of every text fragment a
//! reader sees, in document order. Spans of the same block are joined
//! directly, so a word split across marked-up spans is still one word.
//! Blocks are separated by a newline that belongs to no fragment, which lets
//! whitespace-relaxed queries run across block boundaries.

use std::ops::Range;

use serde::Serialize;

use crate::blocks::{BlockNode, BlockTree};

/// One contiguous piece of rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Pre-order index of the owning block in [`BlockTree::walk`].
    pub block: usize,
    /// Span index inside the block (0 for code and captions).
    pub span: usize,
    /// Byte offset of the fragment in the joined text.
    pub start: usize,
    pub len: usize,
}

impl Fragment {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// A position inside one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextPosition {
    pub fragment: usize,
    /// Byte offset within the fragment.
    pub offset: usize,
}

const BLOCK_SEPARATOR: char = '\n';

/// Joined text plus the fragment table needed to map offsets back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchText {
    text: String,
    fragments: Vec<Fragment>,
}

impl SearchText {
    /// Build from a list of blocks, each given as its fragments' texts.
    /// Empty fragments are skipped, as are blocks left with nothing.
    fn from_blocks<'a>(blocks: impl IntoIterator<Item = (usize, Vec<(usize, &'a str)>)>) -> Self {
        let mut out = SearchText::default();

        for (block, parts) in blocks {
            let parts: Vec<_> = parts.into_iter().filter(|(_, t)| !t.is_empty()).collect();
            if parts.is_empty() {
                continue;
            }
            if !out.text.is_empty() {
                out.text.push(BLOCK_SEPARATOR);
            }
            for (span, text) in parts {
                out.fragments.push(Fragment {
                    block,
                    span,
                    start: out.text.len(),
                    len: text.len(),
                });
                out.text.push_str(text);
            }
        }

        out
    }

    /// Text of a tree as a renderer would show it.
    ///
    /// Unlike the plain-text projection, code blocks and image captions are
    /// rendered on the page and therefore searchable.
    pub fn from_tree(tree: &BlockTree) -> Self {
        Self::from_blocks(tree.walk().enumerate().map(|(index, node)| {
            let parts = match node {
                BlockNode::Paragraph { children } | BlockNode::Heading { children, .. } => {
                    children
                        .iter()
                        .enumerate()
                        .map(|(i, s)| (i, s.text.as_str()))
                        .collect()
                }
                BlockNode::Code { text, .. } => vec![(0, text.as_str())],
                BlockNode::Image { caption, alt, .. } => caption
                    .as_deref()
                    .or(alt.as_deref())
                    .map(|t| vec![(0, t)])
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            (index, parts)
        }))
    }

    /// Text split into fragments, one block per element.
    pub fn from_fragments<S: AsRef<str>>(blocks: &[Vec<S>]) -> Self {
        Self::from_blocks(blocks.iter().enumerate().map(|(block, parts)| {
            (
                block,
                parts
                    .iter()
                    .enumerate()
                    .map(|(span, s)| (span, s.as_ref()))
                    .collect(),
            )
        }))
    }

    /// Single-fragment text.
    pub fn from_plain(text: &str) -> Self {
        Self::from_fragments(&[vec![text]])
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Fragment index holding a `(block, span)` pair.
    pub fn fragment_of(&self, block: usize, span: usize) -> Option<usize> {
        self.fragments
            .binary_search_by(|f| (f.block, f.span).cmp(&(block, span)))
            .ok()
    }

    /// Text of one fragment.
    pub fn fragment_text(&self, fragment: usize) -> &str {
        self.fragments
            .get(fragment)
            .map(|f| &self.text[f.range()])
            .unwrap_or_default()
    }

    /// Locate the fragment containing the byte at `offset`.
    ///
    /// Offsets on a block separator resolve to the fragment after it.
    pub fn locate(&self, offset: usize) -> Option<TextPosition> {
        let idx = self
            .fragments
            .partition_point(|f| f.start + f.len <= offset);
        let fragment = self.fragments.get(idx)?;
        Some(TextPosition {
            fragment: idx,
            offset: offset.saturating_sub(fragment.start),
        })
    }

    /// Position just past the byte range ending at `end` (exclusive).
    pub fn locate_end(&self, end: usize) -> Option<TextPosition> {
        let idx = self.fragments.partition_point(|f| f.start + f.len < end);
        let fragment = self.fragments.get(idx)?;
        Some(TextPosition {
            fragment: idx,
            offset: end.saturating_sub(fragment.start).min(fragment.len),
        })
    }

    /// Pieces of `range` falling inside each fragment, as
    /// `(fragment index, local byte range)`.
    pub fn split_range(&self, range: Range<usize>) -> Vec<(usize, Range<usize>)> {
        let first = self
            .fragments
            .partition_point(|f| f.start + f.len <= range.start);

        self.fragments[first..]
            .iter()
            .enumerate()
            .take_while(|(_, f)| f.start < range.end)
            .filter_map(|(i, f)| {
                let start = range.start.max(f.start);
                let end = range.end.min(f.start + f.len);
                (start < end).then(|| (first + i, start - f.start..end - f.start))
            })
            .collect()
    }
}
