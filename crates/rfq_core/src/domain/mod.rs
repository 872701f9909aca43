use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata key carrying the name of the document a chunk came from.
pub const SOURCE_DOCUMENT_KEY: &str = "source_document";

/// Label used when a chunk carries no document name (single-upload indexes).
pub const UPLOADED_DOCUMENT_LABEL: &str = "Uploaded Document";

/// A chunk as returned by a similarity search. Rank is its position in the
/// returned list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub page_content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RetrievedChunk {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_source_document(mut self, name: impl Into<String>) -> Self {
        self.metadata
            .insert(SOURCE_DOCUMENT_KEY.to_string(), name.into());
        self
    }

    pub fn source_document(&self) -> Option<&str> {
        self.metadata.get(SOURCE_DOCUMENT_KEY).map(String::as_str)
    }

    /// Document name for display, falling back to the upload label.
    pub fn display_source(&self) -> &str {
        self.source_document().unwrap_or(UPLOADED_DOCUMENT_LABEL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRecord {
    pub source_document: String,
    pub content_snippet: String,
}

impl From<&RetrievedChunk> for SourceRecord {
    fn from(chunk: &RetrievedChunk) -> Self {
        Self {
            source_document: chunk.display_source().to_string(),
            content_snippet: chunk.page_content.clone(),
        }
    }
}

/// The renderable result of one question, in the shape consumed by a UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResult {
    pub answer: String,
    pub sources_for_ui: Vec<SourceRecord>,
}

impl QueryResult {
    pub fn message_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources_for_ui: Vec::new(),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
