//! Plain-text projection of block trees.
//!
//! Used for list-view descriptions, search indexes and the "is there
//! anything to show" check. Code blocks, images and rules are presentational
//! and never contribute text.

use crate::blocks::BlockTree;

/// Flatten a tree into whitespace-normalized plain text.
///
/// # Examples
///
/// ```
/// use blockpress::convert::text_to_blocks;
/// use blockpress::plain::to_plain_text;
///
/// let tree = text_to_blocks(Some("Hello\n\n- one\n- two")).unwrap();
/// assert_eq!(to_plain_text(Some(&tree)), "Hello one two");
/// assert_eq!(to_plain_text(None), "");
/// ```
pub fn to_plain_text(tree: Option<&BlockTree>) -> String {
    let Some(tree) = tree else {
        return String::new();
    };

    let parts: Vec<&str> = tree
        .walk()
        .flat_map(|node| node.spans())
        .map(|span| span.text.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect();

    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when the tree has any text, or at least one image.
pub fn has_content(tree: Option<&BlockTree>) -> bool {
    let Some(tree) = tree else {
        return false;
    };
    !to_plain_text(Some(tree)).is_empty() || tree.contains_image()
}

/// Plain text shortened to at most `max_chars` characters.
///
/// The cut happens at the last word break that fits and an ellipsis is
/// appended. Text that already fits is returned as is.
pub fn preview(tree: Option<&BlockTree>, max_chars: usize) -> String {
    let text = to_plain_text(tree);
    if text.chars().count() <= max_chars {
        return text;
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let head = match head.rfind(' ') {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };
    format!("{}…", head.trim_end())
}
