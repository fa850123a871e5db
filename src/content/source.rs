//! Fetching raw documents from a content store.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::Document;

/// Result type for content source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while reading documents
#[derive(Debug)]
pub enum SourceError {
    /// Content type names a path outside the store
    InvalidContentType(String),
    /// Reading a file or directory failed
    Io { path: PathBuf, source: std::io::Error },
    /// A file is not valid JSON
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::InvalidContentType(t) => write!(f, "Invalid content type: {}", t),
            SourceError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            SourceError::Parse { path, source } => {
                write!(f, "Invalid JSON in {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::InvalidContentType(_) => None,
            SourceError::Io { source, .. } => Some(source),
            SourceError::Parse { source, .. } => Some(source),
        }
    }
}

/// Which document to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Match the `slug` field.
    Slug(String),
    /// Match `documentId`, or `id` when the document has none.
    Id(String),
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Slug(slug) => field_equals(doc.get("slug"), slug),
            Filter::Id(id) => match doc.get("documentId") {
                Some(document_id) if !document_id.is_null() => field_equals(Some(document_id), id),
                _ => field_equals(doc.get("id"), id),
            },
        }
    }
}

fn field_equals(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

/// A store that can hand out single documents by content type.
pub trait ContentSource {
    /// First document of `content_type` matching `filter`, or `None`.
    fn fetch_document(&self, content_type: &str, filter: &Filter)
    -> SourceResult<Option<Document>>;
}

/// Documents stored as JSON files under `<root>/<content type>/`.
///
/// A file holds either a single document object or a list response of the
/// form `{"data": [...]}`. Files are visited in name order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn type_dir(&self, content_type: &str) -> SourceResult<PathBuf> {
        let valid = !content_type.is_empty()
            && content_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SourceError::InvalidContentType(content_type.to_string()));
        }
        Ok(self.root.join(content_type))
    }

    fn json_files(dir: &Path) -> SourceResult<Vec<PathBuf>> {
        let io_err = |source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_documents(path: &Path) -> SourceResult<Vec<Document>> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(documents_in(value))
    }
}

/// Documents held by one stored JSON value.
fn documents_in(value: Value) -> Vec<Document> {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(doc) => Some(doc),
                    _ => None,
                })
                .collect(),
            Some(Value::Object(doc)) => vec![doc],
            Some(Value::Null) => Vec::new(),
            Some(other) => {
                map.insert("data".to_string(), other);
                vec![map]
            }
            None => vec![map],
        },
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(doc) => Some(doc),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl ContentSource for DirectorySource {
    fn fetch_document(
        &self,
        content_type: &str,
        filter: &Filter,
    ) -> SourceResult<Option<Document>> {
        let dir = self.type_dir(content_type)?;
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "content type directory missing");
            return Ok(None);
        }

        for path in Self::json_files(&dir)? {
            let found = Self::read_documents(&path)?
                .into_iter()
                .find(|doc| filter.matches(doc));
            if let Some(doc) = found {
                tracing::debug!(path = %path.display(), "document found");
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }
}
