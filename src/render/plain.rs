//! Markdown-flavoured plain text renderer.

use serde::{Deserialize, Serialize};

use super::BlockRenderer;
use super::highlight::{Highlights, Segment, SegmentKind};
use crate::blocks::{BlockNode, BlockTree, ListFormat, TextSpan};

/// Markers wrapped around search matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub match_open: String,
    pub match_close: String,
    pub active_open: String,
    pub active_close: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            match_open: "[".to_string(),
            match_close: "]".to_string(),
            active_open: "[>".to_string(),
            active_close: "<]".to_string(),
        }
    }
}

/// Renders a tree as lightly marked-up text: `#` headings, `-` and `1.`
/// list markers, `>` quotes, fenced code and `**bold**`/`_italic_`/`~~struck~~`
/// spans. Underline has no text marker and is written as plain text.
/// Top-level blocks are separated by a blank line.
#[derive(Debug, Clone, Default)]
pub struct PlainRenderer {
    style: HighlightStyle,
}

impl PlainRenderer {
    pub fn new(style: HighlightStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &HighlightStyle {
        &self.style
    }
}

impl BlockRenderer for PlainRenderer {
    type Output = String;

    fn render(&self, tree: &BlockTree, highlights: Option<&Highlights<'_>>) -> String {
        let mut writer = Writer {
            style: &self.style,
            highlights,
            next_block: 0,
            lines: Vec::new(),
        };

        let mut out: Vec<String> = Vec::new();
        for node in tree.blocks() {
            writer.node(node, "", "");
            let lines = std::mem::take(&mut writer.lines);
            if lines.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(String::new());
            }
            out.extend(lines);
        }
        out.join("\n")
    }
}

struct Writer<'r, 'h> {
    style: &'r HighlightStyle,
    highlights: Option<&'r Highlights<'h>>,
    /// Pre-order index of the next block, matching `BlockTree::walk`.
    next_block: usize,
    lines: Vec<String>,
}

impl Writer<'_, '_> {
    fn node(&mut self, node: &BlockNode, first: &str, rest: &str) {
        let index = self.next_block;
        self.next_block += 1;

        match node {
            BlockNode::Paragraph { children } => {
                if node.is_empty_paragraph() {
                    return;
                }
                let text = self.inline(index, children);
                self.push(first, rest, &text);
            }
            BlockNode::Heading { level, children } => {
                let text = format!(
                    "{} {}",
                    "#".repeat(usize::from(*level)),
                    self.inline(index, children)
                );
                self.push(first, rest, &text);
            }
            BlockNode::List { format, items } => {
                for (n, item) in items.iter().enumerate() {
                    let marker = match format {
                        ListFormat::Ordered => format!("{}. ", n + 1),
                        ListFormat::Unordered => "- ".to_string(),
                    };
                    let lead = if n == 0 { first } else { rest };
                    let item_first = format!("{lead}{marker}");
                    let item_rest = format!("{rest}{}", " ".repeat(marker.len()));

                    if item.children.is_empty() {
                        self.push(&item_first, &item_rest, "");
                    }
                    for (i, child) in item.children.iter().enumerate() {
                        let child_first = if i == 0 { &item_first } else { &item_rest };
                        self.node(child, child_first, &item_rest);
                    }
                }
            }
            BlockNode::HorizontalRule => self.push(first, rest, "---"),
            BlockNode::Image { url, alt, caption } => {
                // the searchable label is the caption, or the alt text without one
                let alt_text = match (alt, caption) {
                    (Some(alt), Some(_)) => alt.clone(),
                    (Some(alt), None) => self.segments(index, 0, alt),
                    (None, _) => String::new(),
                };
                self.push(first, rest, &format!("![{alt_text}]({url})"));
                if let Some(caption) = caption {
                    let text = self.segments(index, 0, caption);
                    self.push(rest, rest, &text);
                }
            }
            BlockNode::Quote { children } => {
                if children.is_empty() {
                    self.push(first, rest, ">");
                }
                let quote_first = format!("{first}> ");
                let quote_rest = format!("{rest}> ");
                for (i, child) in children.iter().enumerate() {
                    let lead = if i == 0 { &quote_first } else { &quote_rest };
                    self.node(child, lead, &quote_rest);
                }
            }
            BlockNode::Code { text, language } => {
                let fence = format!("```{}", language.as_deref().unwrap_or_default());
                self.push(first, rest, &fence);
                let body = self.segments(index, 0, text);
                self.push(rest, rest, &body);
                self.push(rest, rest, "```");
            }
        }
    }

    fn inline(&self, block: usize, spans: &[TextSpan]) -> String {
        let mut out = String::new();
        for (i, span) in spans.iter().enumerate() {
            if span.is_empty() {
                continue;
            }
            let mut wrappers = Vec::new();
            if span.marks.bold {
                wrappers.push("**");
            }
            if span.marks.italic {
                wrappers.push("_");
            }
            if span.marks.strikethrough {
                wrappers.push("~~");
            }

            for w in &wrappers {
                out.push_str(w);
            }
            out.push_str(&self.segments(block, i, &span.text));
            for w in wrappers.iter().rev() {
                out.push_str(w);
            }
        }
        out
    }

    /// Text of one fragment with match markers applied.
    fn segments(&self, block: usize, span: usize, text: &str) -> String {
        let Some(highlights) = self.highlights else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len());
        for Segment { text, kind } in highlights.segment(block, span, text) {
            match kind {
                SegmentKind::Plain => out.push_str(text),
                SegmentKind::Match { active: true, .. } => {
                    out.push_str(&self.style.active_open);
                    out.push_str(text);
                    out.push_str(&self.style.active_close);
                }
                SegmentKind::Match { active: false, .. } => {
                    out.push_str(&self.style.match_open);
                    out.push_str(text);
                    out.push_str(&self.style.match_close);
                }
            }
        }
        out
    }

    fn push(&mut self, first: &str, rest: &str, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            let prefix = if i == 0 { first } else { rest };
            self.lines
                .push(format!("{prefix}{line}").trim_end().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{ListItem, Marks};
    use crate::search::{SearchEngine, SearchText};

    fn render(tree: &BlockTree) -> String {
        PlainRenderer::default().render(tree, None)
    }

    #[test]
    fn test_render_basic_blocks() {
        let tree = BlockTree::new(vec![
            BlockNode::heading(2, vec![TextSpan::plain("Intro")]),
            BlockNode::paragraph(vec![
                TextSpan::plain("plain "),
                TextSpan::styled(
                    "bold",
                    Marks {
                        bold: true,
                        ..Marks::default()
                    },
                ),
            ]),
            BlockNode::empty_paragraph(),
            BlockNode::HorizontalRule,
        ]);
        assert_eq!(render(&tree), "## Intro\n\nplain **bold**\n\n---");
    }

    #[test]
    fn test_render_underline_unmarked() {
        let tree = BlockTree::new(vec![BlockNode::paragraph(vec![TextSpan::styled(
            "under",
            Marks {
                underline: true,
                italic: true,
                ..Marks::default()
            },
        )])]);
        assert_eq!(render(&tree), "_under_");
    }

    #[test]
    fn test_render_lists() {
        let tree = BlockTree::new(vec![
            BlockNode::list(
                ListFormat::Ordered,
                vec![
                    ListItem::text("first"),
                    ListItem::new(vec![
                        BlockNode::paragraph(vec![TextSpan::plain("second")]),
                        BlockNode::list(ListFormat::Unordered, vec![ListItem::text("nested")])
                            .unwrap(),
                    ]),
                ],
            )
            .unwrap(),
        ]);
        assert_eq!(render(&tree), "1. first\n2. second\n   - nested");
    }

    #[test]
    fn test_render_quote_and_code() {
        let tree = BlockTree::new(vec![
            BlockNode::Quote {
                children: vec![
                    BlockNode::paragraph(vec![TextSpan::plain("said")]),
                    BlockNode::paragraph(vec![TextSpan::plain("twice")]),
                ],
            },
            BlockNode::Code {
                text: "a\nb".to_string(),
                language: Some("rust".to_string()),
            },
        ]);
        assert_eq!(render(&tree), "> said\n> twice\n\n```rust\na\nb\n```");
    }

    #[test]
    fn test_render_image() {
        let tree = BlockTree::new(vec![BlockNode::Image {
            url: "/a.png".to_string(),
            alt: Some("alt".to_string()),
            caption: Some("Caption".to_string()),
        }]);
        assert_eq!(render(&tree), "![alt](/a.png)\nCaption");
    }

    #[test]
    fn test_render_highlights_active_match() {
        let tree = BlockTree::new(vec![
            BlockNode::heading(1, vec![TextSpan::plain("Cats")]),
            BlockNode::list(
                ListFormat::Unordered,
                vec![ListItem::text("a cat"), ListItem::text("no dogs")],
            )
            .unwrap(),
            BlockNode::paragraph(vec![TextSpan::plain("the cat sat")]),
        ]);

        let mut engine = SearchEngine::new(SearchText::from_tree(&tree));
        assert_eq!(engine.set_query("cat"), 3);
        engine.next();

        let highlights = Highlights::from_engine(&engine);
        let out = PlainRenderer::default().render(&tree, Some(&highlights));
        assert_eq!(out, "# [Cat]s\n\n- a [>cat<]\n- no dogs\n\nthe [cat] sat");
    }

    #[test]
    fn test_render_highlight_split_by_marks() {
        let tree = BlockTree::new(vec![BlockNode::paragraph(vec![
            TextSpan::plain("the c"),
            TextSpan::styled(
                "at",
                Marks {
                    italic: true,
                    ..Marks::default()
                },
            ),
        ])]);
        let text = SearchText::from_tree(&tree);
        let matches = crate::search::compute_matches(&text, "cat");
        let highlights = Highlights::new(&text, &matches, None);

        let out = PlainRenderer::new(HighlightStyle {
            match_open: "<".to_string(),
            match_close: ">".to_string(),
            ..HighlightStyle::default()
        })
        .render(&tree, Some(&highlights));
        assert_eq!(out, "the <c>_<at>_");
    }
}
