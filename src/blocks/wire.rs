//! CMS JSON shape of a block tree.
//!
//! Reading is lenient: inline nodes found where blocks are expected are
//! wrapped in a paragraph, links are flattened into their text, and unknown
//! or malformed nodes are skipped one at a time. Writing always produces the
//! canonical shape.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::{BlockNode, BlockTree, ListFormat, ListItem, Marks, TextSpan};

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WireImage {
    #[serde(default)]
    url: String,
    #[serde(
        rename = "alternativeText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    alternative_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub(crate) enum WireNode {
    Paragraph {
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    Heading {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<i64>,
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    ListItem {
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    ListItemChild {
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    HorizontalRule,
    Image {
        #[serde(default)]
        image: WireImage,
    },
    Quote {
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    Link {
        #[serde(default)]
        url: String,
        #[serde(default, deserialize_with = "lenient_nodes")]
        children: Vec<WireNode>,
    },
    Text {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "is_false")]
        bold: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        italic: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        underline: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        strikethrough: bool,
    },
    #[serde(other)]
    Unknown,
}

/// A node, or anything that failed to read as one.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNode {
    Node(WireNode),
    Invalid(IgnoredAny),
}

/// Read a node list, dropping entries that are not valid nodes. A missing or
/// `null` list is empty.
fn lenient_nodes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<WireNode>, D::Error> {
    let nodes = Option::<Vec<LenientNode>>::deserialize(deserializer)?;
    Ok(nodes
        .into_iter()
        .flatten()
        .filter_map(|node| match node {
            LenientNode::Node(node) => Some(node),
            LenientNode::Invalid(_) => None,
        })
        .collect())
}

/// Top-level node list of a stored tree.
#[derive(Deserialize)]
pub(crate) struct WireNodes(#[serde(deserialize_with = "lenient_nodes")] Vec<WireNode>);

impl WireNode {
    fn is_inline(&self) -> bool {
        matches!(self, WireNode::Text { .. } | WireNode::Link { .. })
    }
}

impl From<WireNodes> for BlockTree {
    fn from(WireNodes(nodes): WireNodes) -> Self {
        BlockTree::new(from_wire(nodes))
    }
}

impl From<BlockTree> for Vec<WireNode> {
    fn from(tree: BlockTree) -> Self {
        to_wire(&tree.blocks)
    }
}

/// Flatten inline wire nodes into spans.
fn spans_from_wire(nodes: Vec<WireNode>, out: &mut Vec<TextSpan>) {
    for node in nodes {
        match node {
            WireNode::Text {
                text,
                bold,
                italic,
                underline,
                strikethrough,
            } => out.push(TextSpan::styled(
                text,
                Marks {
                    bold,
                    italic,
                    underline,
                    strikethrough,
                },
            )),
            WireNode::Link { children, .. } => spans_from_wire(children, out),
            _ => {}
        }
    }
}

fn inline_text(nodes: Vec<WireNode>) -> String {
    let mut spans = Vec::new();
    spans_from_wire(nodes, &mut spans);
    spans.into_iter().map(|s| s.text).collect()
}

/// Convert a sequence of wire nodes where blocks are expected.
fn from_wire(nodes: Vec<WireNode>) -> Vec<BlockNode> {
    let mut blocks = Vec::new();
    let mut pending_inline = Vec::new();

    for node in nodes {
        if node.is_inline() {
            pending_inline.push(node);
            continue;
        }
        if !pending_inline.is_empty() {
            let mut spans = Vec::new();
            spans_from_wire(std::mem::take(&mut pending_inline), &mut spans);
            blocks.push(BlockNode::paragraph(spans));
        }

        match node {
            WireNode::Paragraph { children } => {
                let mut spans = Vec::new();
                spans_from_wire(children, &mut spans);
                blocks.push(BlockNode::paragraph(spans));
            }
            WireNode::Heading { level, children } => {
                let mut spans = Vec::new();
                spans_from_wire(children, &mut spans);
                blocks.push(BlockNode::heading(level.unwrap_or(3), spans));
            }
            WireNode::List { format, children } => {
                let format = match format.as_deref() {
                    Some("ordered") => ListFormat::Ordered,
                    _ => ListFormat::Unordered,
                };
                let items = children
                    .into_iter()
                    .filter_map(|child| match child {
                        WireNode::ListItem { children } => Some(ListItem::new(from_wire(children))),
                        WireNode::Unknown => None,
                        other => Some(ListItem::new(from_wire(vec![other]))),
                    })
                    .filter(|item| !item.children.is_empty())
                    .collect();
                blocks.extend(BlockNode::list(format, items));
            }
            // Stray wrappers outside a list contribute their content.
            WireNode::ListItem { children } | WireNode::ListItemChild { children } => {
                blocks.extend(from_wire(children));
            }
            WireNode::HorizontalRule => blocks.push(BlockNode::HorizontalRule),
            WireNode::Image { image } => blocks.push(BlockNode::Image {
                url: image.url,
                alt: image.alternative_text,
                caption: image.caption,
            }),
            WireNode::Quote { children } => blocks.push(BlockNode::Quote {
                children: from_wire(children),
            }),
            WireNode::Code { language, children } => blocks.push(BlockNode::Code {
                text: inline_text(children),
                language,
            }),
            WireNode::Text { .. } | WireNode::Link { .. } | WireNode::Unknown => {}
        }
    }

    if !pending_inline.is_empty() {
        let mut spans = Vec::new();
        spans_from_wire(pending_inline, &mut spans);
        blocks.push(BlockNode::paragraph(spans));
    }

    blocks
}

fn span_to_wire(span: &TextSpan) -> WireNode {
    WireNode::Text {
        text: span.text.clone(),
        bold: span.marks.bold,
        italic: span.marks.italic,
        underline: span.marks.underline,
        strikethrough: span.marks.strikethrough,
    }
}

pub(crate) fn to_wire(blocks: &[BlockNode]) -> Vec<WireNode> {
    blocks
        .iter()
        .map(|block| match block {
            BlockNode::Paragraph { children } => WireNode::Paragraph {
                children: children.iter().map(span_to_wire).collect(),
            },
            BlockNode::Heading { level, children } => WireNode::Heading {
                level: Some(i64::from(*level)),
                children: children.iter().map(span_to_wire).collect(),
            },
            BlockNode::List { format, items } => WireNode::List {
                format: Some(format.to_string()),
                children: items
                    .iter()
                    .map(|item| WireNode::ListItem {
                        children: vec![WireNode::ListItemChild {
                            children: to_wire(&item.children),
                        }],
                    })
                    .collect(),
            },
            BlockNode::HorizontalRule => WireNode::HorizontalRule,
            BlockNode::Image { url, alt, caption } => WireNode::Image {
                image: WireImage {
                    url: url.clone(),
                    alternative_text: alt.clone(),
                    caption: caption.clone(),
                },
            },
            BlockNode::Quote { children } => WireNode::Quote {
                children: to_wire(children),
            },
            BlockNode::Code { text, language } => WireNode::Code {
                language: language.clone(),
                children: vec![WireNode::Text {
                    text: text.clone(),
                    bold: false,
                    italic: false,
                    underline: false,
                    strikethrough: false,
                }],
            },
        })
        .collect()
}
