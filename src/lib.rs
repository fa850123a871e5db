//! # blockpress
//!
//! Structured rich text for a headless CMS: a typed block tree plus the
//! pieces that move content in and out of it.
//!
//! Editors historically stored plain text; newer entries store a JSON block
//! tree. This library reconciles the two and serves the read side of a
//! document page.
//!
//! ## Features
//!
//! - Typed block tree with the CMS JSON shape on the wire
//! - Legacy plain text to blocks, with bulleted and numbered list detection
//! - Plain-text projection for previews, search indexes and emptiness checks
//! - Whitelist-based rebuilding of pasted video embeds (https only)
//! - In-document search with numbered matches and wraparound navigation
//! - Text rendering with search highlights
//! - Field normalization and view-model mapping for CMS documents
//!
//! ## Example
//!
//! ```rust
//! use blockpress::convert::text_to_blocks;
//! use blockpress::plain::to_plain_text;
//! use blockpress::search::{SearchEngine, SearchText};
//!
//! let tree = text_to_blocks(Some("Flood of 1983\n\n- river rose\n- town flooded")).unwrap();
//! assert_eq!(to_plain_text(Some(&tree)), "Flood of 1983 river rose town flooded");
//!
//! let mut engine = SearchEngine::new(SearchText::from_tree(&tree));
//! assert_eq!(engine.set_query("FLOOD"), 2);
//! engine.next();
//! assert_eq!(engine.status().to_string(), "2/2");
//! ```

/// Block tree model and its JSON representation.
pub mod blocks;

/// Configuration module for persisting user preferences.
///
/// Provides the asset host, normalized fields, highlight markers and log level.
pub mod config;

/// CMS documents: directory store, field normalization and view models.
pub mod content;

/// Conversion of legacy plain text into block trees.
pub mod convert;

/// Video embed sanitizing.
pub mod embed;

/// Input handling module for stdin and file sources.
pub mod input;

/// Plain-text projection of block trees.
pub mod plain;

/// Rendering block trees with optional search highlights.
pub mod render;

/// In-document search.
pub mod search;

// Re-export commonly used types
pub use blocks::{BlockNode, BlockTree, ListFormat, ListItem, Marks, TextSpan};
pub use config::Config;
pub use convert::{FieldValue, ensure_blocks, text_to_blocks};
pub use embed::{VideoEmbed, sanitize};
pub use plain::{has_content, to_plain_text};
pub use search::{SearchEngine, SearchMatch, SearchText};
