use std::time::Duration;

use rfq_core::config::AzureSearchSettings;
use rfq_core::domain::{RetrievedChunk, SOURCE_DOCUMENT_KEY};
use rfq_core::error::AppError;
use serde::Deserialize;
use tracing::debug;

use super::{MetadataFilter, VectorIndex};
use crate::embeddings::Embedder;
use crate::provider::send_json;

const SEARCH_API_VERSION: &str = "2023-11-01";

/// Azure AI Search index holding the shared corpus. Documents carry the chunk
/// text in `content`, the embedding in `content_vector` and the document name
/// in a filterable `source_document` field.
#[derive(Debug, Clone)]
pub struct AzureSearchIndex {
    endpoint: String,
    api_key: String,
    index_name: String,
    content_field: String,
    vector_field: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    value: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl AzureSearchIndex {
    pub fn new(settings: &AzureSearchSettings) -> Result<Self, AppError> {
        let endpoint = settings.endpoint.trim().trim_end_matches('/').to_string();
        if !endpoint.starts_with("https://") {
            return Err(AppError::new(
                "INDEX_CONFIG_INVALID",
                "Azure AI Search endpoint must use https",
            )
            .with_details(format!("endpoint={endpoint}")));
        }
        Ok(Self {
            endpoint,
            api_key: settings.api_key.clone(),
            index_name: settings.index_name.clone(),
            content_field: "content".to_string(),
            vector_field: "content_vector".to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index_name, SEARCH_API_VERSION
        )
    }

    pub(crate) fn search_body(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "vectorQueries": [{
                "kind": "vector",
                "vector": vector,
                "fields": self.vector_field,
                "k": k,
            }],
            "top": k,
            "select": format!("{},{}", self.content_field, SOURCE_DOCUMENT_KEY),
        });
        if let Some(f) = filter {
            body["filter"] = serde_json::Value::String(odata_eq(&f.field, &f.value));
        }
        body
    }

    fn to_chunk(&self, doc: &serde_json::Map<String, serde_json::Value>) -> Result<RetrievedChunk, AppError> {
        let content = doc
            .get(&self.content_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::new("AI_RETRIEVAL_FAILED", "Search result is missing chunk content")
                    .with_details(format!("field={}", self.content_field))
            })?;
        let mut chunk = RetrievedChunk::new(content);
        if let Some(name) = doc.get(SOURCE_DOCUMENT_KEY).and_then(|v| v.as_str()) {
            chunk = chunk.with_source_document(name);
        }
        Ok(chunk)
    }
}

/// OData equality with single quotes doubled, so a document name cannot
/// escape the string literal.
pub(crate) fn odata_eq(field: &str, value: &str) -> String {
    format!("{field} eq '{}'", value.replace('\'', "''"))
}

impl VectorIndex for AzureSearchIndex {
    fn supports_filtering(&self) -> bool {
        true
    }

    fn similarity_search(
        &self,
        embedder: &dyn Embedder,
        model: &str,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        let qv = embedder.embed(model, query)?;
        let body = self.search_body(&qv, k, filter);
        debug!(index = self.index_name.as_str(), k, filtered = filter.is_some(), "azure search");

        let req = ureq::post(&self.search_url())
            .timeout(Duration::from_secs(15))
            .set("api-key", &self.api_key);
        let resp: SearchResponse = send_json(req, body, "AI_RETRIEVAL_FAILED", "search")?;

        resp.value.iter().take(k).map(|doc| self.to_chunk(doc)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> AzureSearchIndex {
        AzureSearchIndex::new(&AzureSearchSettings {
            endpoint: "https://tenders.search.windows.net/".to_string(),
            api_key: "key".to_string(),
            index_name: "rfp-index".to_string(),
        })
        .expect("index")
    }

    #[test]
    fn filter_quotes_are_escaped() {
        assert_eq!(
            odata_eq("source_document", "Bidder's Pack.pdf"),
            "source_document eq 'Bidder''s Pack.pdf'"
        );
    }

    #[test]
    fn search_body_carries_vector_query_and_optional_filter() {
        let idx = index();
        assert_eq!(
            idx.search_url(),
            "https://tenders.search.windows.net/indexes/rfp-index/docs/search?api-version=2023-11-01"
        );

        let unfiltered = idx.search_body(&[0.5, 0.25], 3, None);
        assert_eq!(unfiltered["vectorQueries"][0]["fields"], "content_vector");
        assert_eq!(unfiltered["vectorQueries"][0]["k"], 3);
        assert!(unfiltered.get("filter").is_none());

        let filtered = idx.search_body(&[0.5], 3, Some(&MetadataFilter::source_document("DocA.pdf")));
        assert_eq!(filtered["filter"], "source_document eq 'DocA.pdf'");
    }

    #[test]
    fn results_map_to_chunks() {
        let idx = index();
        let doc: serde_json::Map<String, serde_json::Value> = serde_json::from_str(
            r#"{"@search.score":0.8,"content":"Deadline is May 1st","source_document":"DocA.pdf"}"#,
        )
        .expect("doc");
        let chunk = idx.to_chunk(&doc).expect("chunk");
        assert_eq!(chunk.page_content, "Deadline is May 1st");
        assert_eq!(chunk.source_document(), Some("DocA.pdf"));

        let missing: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"source_document":"DocA.pdf"}"#).expect("doc");
        assert_eq!(idx.to_chunk(&missing).expect_err("missing").code, "AI_RETRIEVAL_FAILED");
    }

    #[test]
    fn rejects_plain_http_endpoints() {
        let err = AzureSearchIndex::new(&AzureSearchSettings {
            endpoint: "http://tenders.search.windows.net".to_string(),
            api_key: "key".to_string(),
            index_name: "rfp-index".to_string(),
        })
        .expect_err("http");
        assert_eq!(err.code, "INDEX_CONFIG_INVALID");
    }
}
