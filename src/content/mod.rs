//! CMS documents: fetching, field normalization and view models.
//!
//! Raw documents are untyped JSON objects ([`Document`]). Before they are
//! stored or returned, rich text fields are normalized with
//! [`ensure_blocks`](crate::convert::ensure_blocks) so readers never see legacy
//! plain text. [`ContentMapper`] then turns typed documents into the view
//! models a front end consumes, with asset URLs made absolute.

mod record;
mod source;
mod story;

pub use record::{
    MediaAsset, MediaData, MediaInput, MediaSource, RecordDocument, SourceRecord,
    VideoEmbedDocument,
};
pub use source::{ContentSource, DirectorySource, Filter, SourceError, SourceResult};
pub use story::{
    Story, StoryDocument, SummaryCard, SummaryCardDocument, TimelineEntry, TimelineEntryDocument,
};

use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::blocks::BlockTree;
use crate::convert::ensure_blocks_json;
use crate::plain::has_content;

/// Asset host used when none is configured.
pub const DEFAULT_ASSET_BASE: &str = "http://localhost:1337";

/// A raw CMS document.
pub type Document = serde_json::Map<String, Value>;

/// Field normalized by default when a document is written or read.
pub const DEFAULT_NORMALIZED_FIELD: &str = "searchableContent";

/// Bring each named field into block form.
///
/// Stored arrays are left exactly as they are. Legacy text is converted, and
/// anything else (text without content, missing fields, other JSON values)
/// becomes `null`.
///
/// Returns how many fields changed value.
pub fn normalize_document<S: AsRef<str>>(doc: &mut Document, fields: &[S]) -> usize {
    let mut changed = 0;
    for field in fields {
        let field = field.as_ref();
        if doc.get(field).is_some_and(Value::is_array) {
            continue;
        }

        let current = doc.get(field).cloned().unwrap_or(Value::Null);
        let next = ensure_blocks_json(&current)
            .map(|tree| tree.to_json())
            .unwrap_or(Value::Null);

        if next != current || !doc.contains_key(field) {
            tracing::debug!(field, "normalized document field");
            changed += 1;
        }
        doc.insert(field.to_string(), next);
    }
    changed
}

/// [`normalize_document`] over a single document or a list of them.
/// Anything else is left untouched.
pub fn normalize_documents<S: AsRef<str>>(value: &mut Value, fields: &[S]) -> usize {
    match value {
        Value::Object(doc) => normalize_document(doc, fields),
        Value::Array(items) => items
            .iter_mut()
            .filter_map(|item| item.as_object_mut())
            .map(|doc| normalize_document(doc, fields))
            .sum(),
        _ => 0,
    }
}

/// Read a field the CMS may send as `null`, using the type's default then.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Turns stored asset paths into absolute URLs.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    base: Url,
}

impl AssetResolver {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `path`. Absolute http(s) URLs pass through;
    /// anything that cannot be joined is returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        let lower = path.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || path.is_empty() {
            return path.to_string();
        }
        match self.base.join(path) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(path, error = %e, "asset path left as is");
                path.to_string()
            }
        }
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        static BASE: OnceLock<Url> = OnceLock::new();
        Self {
            base: BASE
                .get_or_init(|| Url::parse(DEFAULT_ASSET_BASE).unwrap())
                .clone(),
        }
    }
}

/// Maps typed documents to view models.
#[derive(Debug, Clone)]
pub struct ContentMapper {
    assets: AssetResolver,
    default_location: String,
}

impl Default for ContentMapper {
    fn default() -> Self {
        Self::new(AssetResolver::default())
    }
}

impl ContentMapper {
    pub fn new(assets: AssetResolver) -> Self {
        Self {
            assets,
            default_location: "Marlborough".to_string(),
        }
    }

    /// Location used for stories that do not name one.
    pub fn with_default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    /// Image URLs made absolute; `None` unless the tree has content.
    pub fn normalize_blocks(&self, tree: Option<BlockTree>) -> Option<BlockTree> {
        tree.map(|tree| tree.map_image_urls(|url| self.assets.resolve(url)))
            .filter(|tree| has_content(Some(tree)))
    }

    /// [`ensure_blocks_json`] followed by [`Self::normalize_blocks`].
    pub fn normalize_field(&self, value: Option<&Value>) -> Option<BlockTree> {
        self.normalize_blocks(value.and_then(ensure_blocks_json))
    }
}

/// Stable string id: `documentId` when present, else the numeric or string `id`.
fn document_key(document_id: Option<&str>, id: &Value) -> String {
    match (document_id, id) {
        (Some(doc_id), _) => doc_id.to_string(),
        (None, Value::String(s)) => s.clone(),
        (None, Value::Null) => String::new(),
        (None, other) => other.to_string(),
    }
}
