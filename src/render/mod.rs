//! Rendering block trees for display.
//!
//! A renderer walks a [`BlockTree`] in the same pre-order as
//! [`BlockTree::walk`], so block indices line up with the fragments of a
//! [`SearchText`](crate::search::SearchText) built from the same tree and
//! search highlights can be placed span by span.

mod highlight;
mod plain;

pub use highlight::{Highlights, MatchPiece, Segment, SegmentKind, segment_text};
pub use plain::{HighlightStyle, PlainRenderer};

use crate::blocks::BlockTree;

/// Something that turns a block tree into displayable output.
pub trait BlockRenderer {
    type Output;

    /// Render `tree`, marking the matches in `highlights` if given.
    fn render(&self, tree: &BlockTree, highlights: Option<&Highlights<'_>>) -> Self::Output;
}
