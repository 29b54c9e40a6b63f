//! Document Store: hierarchical JSON documents addressed by `/`-separated paths.
//!
//! Every remote read and write in Pathway goes through `DocumentStore`.
//! Writes are upserts: setting the same path twice leaves exactly one document
//! holding the latest value (per-key last-write-wins).
//!
//! `AppState` holds an `Arc<dyn DocumentStore>`; Postgres in production,
//! `MemoryDocumentStore` in tests.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A validated document path such as `visitors/xyz123/<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Builds a path from segments. Each segment must be non-empty and free of `/`.
    pub fn new<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidPath("path has no segments".to_string()));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Parses `a/b/c`. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        Self::new(raw.trim_matches('/').split('/'))
    }

    /// The last segment.
    pub fn key(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The path without its last segment, or `None` for a top-level path.
    pub fn parent(&self) -> Option<DocPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The joined parent path; `""` for a top-level document.
    pub fn parent_string(&self) -> String {
        self.parent().map(|p| p.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.trim().is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".to_string()));
    }
    if segment.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "segment '{segment}' must not contain '/'"
        )));
    }
    Ok(())
}

/// A direct child of a listed path.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub body: Value,
}

/// The document store trait. Implement this to swap backends without touching
/// the repository or handler code.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point-read of a single document.
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    /// Upsert. Overwrites any existing document at `path`.
    async fn set(&self, path: &DocPath, body: Value) -> Result<(), StoreError>;

    /// Direct children of `path`, ordered by key.
    async fn list(&self, path: &DocPath) -> Result<Vec<Document>, StoreError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = DocPath::parse("/visitors/xyz123/abc/").unwrap();
        assert_eq!(path.to_string(), "visitors/xyz123/abc");
        assert_eq!(path.key(), "abc");
        assert_eq!(path.parent_string(), "visitors/xyz123");
    }

    #[test]
    fn test_top_level_has_no_parent() {
        let path = DocPath::parse("jobs").unwrap();
        assert!(path.parent().is_none());
        assert_eq!(path.parent_string(), "");
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(DocPath::parse("visitors//abc").is_err());
        assert!(DocPath::parse("").is_err());
        assert!(DocPath::new(["visitors", "  "]).is_err());
    }

    #[test]
    fn test_segment_with_slash_rejected() {
        assert!(DocPath::new(["visitors", "a/b"]).is_err());
    }
}
