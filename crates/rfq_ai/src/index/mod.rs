use std::collections::BTreeMap;

use rfq_core::domain::{RetrievedChunk, SOURCE_DOCUMENT_KEY};
use rfq_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;

pub mod azure_search;
pub mod corpus;
pub mod upload;

mod similarity;

pub use azure_search::AzureSearchIndex;
pub use corpus::{CorpusAddInput, CorpusAddResult, CorpusIndex, CorpusIndexStatus};
pub use upload::UploadIndex;

/// Equality predicate on one metadata field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataFilter {
    pub field: String,
    pub value: String,
}

impl MetadataFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn source_document(name: impl Into<String>) -> Self {
        Self::eq(SOURCE_DOCUMENT_KEY, name)
    }

    pub fn matches(&self, metadata: &BTreeMap<String, String>) -> bool {
        metadata.get(&self.field) == Some(&self.value)
    }
}

/// A similarity-searchable chunk store.
///
/// Results are ordered best match first and hold at most `k` chunks. A filter
/// is only passed by callers when `supports_filtering` returns true.
pub trait VectorIndex {
    fn supports_filtering(&self) -> bool;

    fn similarity_search(
        &self,
        embedder: &dyn Embedder,
        model: &str,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedChunk>, AppError>;
}
