//! Legacy text to block-tree conversion.
//!
//! Older CMS entries store body fields as plain strings. This module turns
//! that line-oriented text into a [`BlockTree`]: consecutive bullet or
//! numbered lines become a single list, every other line a paragraph, and
//! blank lines are kept as empty placeholder paragraphs.
//!
//! Fields whose migration state is unknown go through [`ensure_blocks`] once,
//! at the content boundary.

use regex::Regex;
use std::sync::OnceLock;

use crate::blocks::{BlockNode, BlockTree, ListFormat, ListItem, TextSpan};

/// List lines accumulated while walking the input.
struct ListBuffer {
    format: ListFormat,
    items: Vec<String>,
}

/// Push the buffered list (if any) onto `blocks`.
fn flush_list(buffer: &mut Option<ListBuffer>, blocks: &mut Vec<BlockNode>) {
    if let Some(buffer) = buffer.take() {
        let items = buffer.items.into_iter().map(ListItem::text).collect();
        blocks.extend(BlockNode::list(buffer.format, items));
    }
}

fn unordered_item(line: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"^[-*•]\s+(.*)$").unwrap());
    re.captures(line)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

fn ordered_item(line: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"^(\d+)[.)]\s+(.*)$").unwrap());
    re.captures(line)
        .and_then(|cap| cap.get(2))
        .map(|m| m.as_str())
}

/// Classify a non-blank, trimmed line as a list item.
///
/// The unordered grammar is tested first. The two marker sets never overlap.
fn list_item(trimmed: &str) -> Option<(ListFormat, &str)> {
    unordered_item(trimmed)
        .map(|item| (ListFormat::Unordered, item))
        .or_else(|| ordered_item(trimmed).map(|item| (ListFormat::Ordered, item)))
}

/// Convert legacy plain text into a block tree.
///
/// Returns `None` for missing, empty or whitespace-only input, and whenever
/// no block was produced.
///
/// # Examples
///
/// ```
/// use blockpress::convert::text_to_blocks;
/// use blockpress::blocks::BlockNode;
///
/// let tree = text_to_blocks(Some("- a\n- b\n- c")).unwrap();
/// assert_eq!(tree.len(), 1);
/// assert!(matches!(&tree.blocks()[0], BlockNode::List { items, .. } if items.len() == 3));
///
/// assert!(text_to_blocks(Some("  \n\t")).is_none());
/// ```
pub fn text_to_blocks(raw: Option<&str>) -> Option<BlockTree> {
    let raw = raw?;
    let sanitized = raw.replace("\r\n", "\n");
    let sanitized = sanitized.trim_end();
    if sanitized.trim().is_empty() {
        return None;
    }

    let mut blocks = Vec::new();
    let mut buffer: Option<ListBuffer> = None;

    for original in sanitized.split('\n') {
        let line = original.trim_end();
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_list(&mut buffer, &mut blocks);
            blocks.push(BlockNode::empty_paragraph());
            continue;
        }

        if let Some((format, item)) = list_item(trimmed) {
            if buffer.as_ref().is_none_or(|b| b.format != format) {
                flush_list(&mut buffer, &mut blocks);
                buffer = Some(ListBuffer {
                    format,
                    items: Vec::new(),
                });
            }
            if let Some(buffer) = buffer.as_mut() {
                buffer.items.push(item.trim().to_string());
            }
            continue;
        }

        flush_list(&mut buffer, &mut blocks);
        blocks.push(BlockNode::paragraph(vec![TextSpan::plain(line)]));
    }

    flush_list(&mut buffer, &mut blocks);

    if blocks.is_empty() {
        None
    } else {
        tracing::trace!(blocks = blocks.len(), "converted legacy text");
        Some(BlockTree::new(blocks))
    }
}

/// A CMS field whose value is either legacy text or an already structured
/// block tree, depending on when the entry was last migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    LegacyText(String),
    Blocks(BlockTree),
    Empty,
}

impl FieldValue {
    /// Classify a raw JSON field.
    ///
    /// Arrays are read as block trees, skipping nodes that do not parse,
    /// strings as legacy text. Anything else is `Empty`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(_) => match BlockTree::from_json(value) {
                Ok(tree) => FieldValue::Blocks(tree),
                Err(e) => {
                    tracing::debug!(error = %e, "field is an array but not a block tree");
                    FieldValue::Empty
                }
            },
            serde_json::Value::String(text) => FieldValue::LegacyText(text.clone()),
            _ => FieldValue::Empty,
        }
    }
}

impl From<BlockTree> for FieldValue {
    fn from(tree: BlockTree) -> Self {
        FieldValue::Blocks(tree)
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::LegacyText(text)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::LegacyText(text.to_string())
    }
}

/// Resolve a field to blocks: structured content passes through untouched,
/// legacy text is converted.
pub fn ensure_blocks(value: FieldValue) -> Option<BlockTree> {
    match value {
        FieldValue::Blocks(tree) => Some(tree),
        FieldValue::LegacyText(text) => text_to_blocks(Some(&text)),
        FieldValue::Empty => None,
    }
}

/// [`ensure_blocks`] over a raw JSON field.
pub fn ensure_blocks_json(value: &serde_json::Value) -> Option<BlockTree> {
    ensure_blocks(FieldValue::from_json(value))
}
