//! Canonical block-tree document model.
//!
//! A [`BlockTree`] is the ordered sequence of top-level blocks making up one
//! document body. Every other stage of the pipeline (conversion, plain-text
//! projection, search, rendering) reads this model; none of them mutate it.
//!
//! The JSON shape stored by the CMS lives in the `wire` submodule and is the only way the
//! tree is (de)serialized.

mod wire;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Inline style marks carried by a [`TextSpan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl Marks {
    /// True when no mark is set.
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline || self.strikethrough)
    }
}

/// Minimal inline text unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub marks: Marks,
}

impl TextSpan {
    /// Span without marks.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// List numbering style.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListFormat {
    Ordered,
    #[default]
    Unordered,
}

/// One entry of a [`BlockNode::List`], wrapping a nested group of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub children: Vec<BlockNode>,
}

impl ListItem {
    pub fn new(children: Vec<BlockNode>) -> Self {
        Self { children }
    }

    /// Item holding a single paragraph of plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![BlockNode::paragraph(vec![TextSpan::plain(text)])])
    }
}

/// Block-level node of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockNode {
    Paragraph {
        children: Vec<TextSpan>,
    },
    Heading {
        level: u8,
        children: Vec<TextSpan>,
    },
    List {
        format: ListFormat,
        items: Vec<ListItem>,
    },
    HorizontalRule,
    Image {
        url: String,
        alt: Option<String>,
        caption: Option<String>,
    },
    Quote {
        children: Vec<BlockNode>,
    },
    Code {
        text: String,
        language: Option<String>,
    },
}

/// Lowest and highest heading level.
pub const HEADING_LEVELS: std::ops::RangeInclusive<u8> = 1..=6;

impl BlockNode {
    /// Paragraph from inline spans. Empty spans are dropped; a paragraph left
    /// with nothing keeps a single empty span, which is how the CMS stores a
    /// blank line.
    pub fn paragraph(spans: Vec<TextSpan>) -> Self {
        let mut children: Vec<TextSpan> = spans.into_iter().filter(|s| !s.is_empty()).collect();
        if children.is_empty() {
            children.push(TextSpan::plain(""));
        }
        BlockNode::Paragraph { children }
    }

    /// Blank-line placeholder paragraph.
    pub fn empty_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    /// Heading with its level saturated into `1..=6`.
    pub fn heading(level: i64, spans: Vec<TextSpan>) -> Self {
        let level = level.clamp(
            i64::from(*HEADING_LEVELS.start()),
            i64::from(*HEADING_LEVELS.end()),
        ) as u8;
        BlockNode::Heading {
            level,
            children: spans.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// List block, or `None` when there are no items to show.
    pub fn list(format: ListFormat, items: Vec<ListItem>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(BlockNode::List { format, items })
        }
    }

    /// Inline spans held directly by this block.
    pub fn spans(&self) -> &[TextSpan] {
        match self {
            BlockNode::Paragraph { children } | BlockNode::Heading { children, .. } => children,
            _ => &[],
        }
    }

    /// True for a paragraph holding no text at all.
    pub fn is_empty_paragraph(&self) -> bool {
        matches!(self, BlockNode::Paragraph { children } if children.iter().all(TextSpan::is_empty))
    }

    fn push_children<'a>(&'a self, stack: &mut Vec<&'a BlockNode>) {
        match self {
            BlockNode::Quote { children } => stack.extend(children.iter().rev()),
            BlockNode::List { items, .. } => {
                for item in items.iter().rev() {
                    stack.extend(item.children.iter().rev());
                }
            }
            _ => {}
        }
    }
}

/// Ordered sequence of top-level blocks for one document.
///
/// The tree is never edited in place: helpers such as [`BlockTree::map_image_urls`]
/// return a new tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "wire::WireNodes", into = "Vec<wire::WireNode>")]
pub struct BlockTree {
    blocks: Vec<BlockNode>,
}

impl BlockTree {
    pub fn new(blocks: Vec<BlockNode>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[BlockNode] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Depth-first, pre-order walk over every block, nested ones included.
    ///
    /// The position of a node in this walk is its block index, used by
    /// search anchors and renderers to refer to the same node.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.blocks.iter().rev().collect(),
        }
    }

    /// True when any block, at any depth, is an image.
    pub fn contains_image(&self) -> bool {
        self.walk().any(|node| matches!(node, BlockNode::Image { .. }))
    }

    /// Copy of the tree with every image URL passed through `f`.
    pub fn map_image_urls(&self, f: impl Fn(&str) -> String) -> BlockTree {
        fn map_node(node: &BlockNode, f: &dyn Fn(&str) -> String) -> BlockNode {
            match node {
                BlockNode::Image { url, alt, caption } => BlockNode::Image {
                    url: f(url),
                    alt: alt.clone(),
                    caption: caption.clone(),
                },
                BlockNode::Quote { children } => BlockNode::Quote {
                    children: children.iter().map(|c| map_node(c, f)).collect(),
                },
                BlockNode::List { format, items } => BlockNode::List {
                    format: *format,
                    items: items
                        .iter()
                        .map(|item| {
                            ListItem::new(item.children.iter().map(|c| map_node(c, f)).collect())
                        })
                        .collect(),
                },
                other => other.clone(),
            }
        }

        BlockTree::new(self.blocks.iter().map(|b| map_node(b, &f)).collect())
    }

    /// Parse the CMS JSON representation.
    pub fn from_json(value: &serde_json::Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    /// Serialize to the CMS JSON representation.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            wire::to_wire(&self.blocks)
                .into_iter()
                .map(|node| serde_json::to_value(node).unwrap_or(serde_json::Value::Null))
                .collect(),
        )
    }
}

impl From<Vec<BlockNode>> for BlockTree {
    fn from(blocks: Vec<BlockNode>) -> Self {
        Self::new(blocks)
    }
}

impl<'a> IntoIterator for &'a BlockTree {
    type Item = &'a BlockNode;
    type IntoIter = std::slice::Iter<'a, BlockNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Iterator returned by [`BlockTree::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a BlockNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a BlockNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        node.push_children(&mut self.stack);
        Some(node)
    }
}
