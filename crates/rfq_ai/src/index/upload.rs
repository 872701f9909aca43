use rfq_core::domain::RetrievedChunk;
use rfq_core::error::AppError;
use rfq_core::ingest::{ChunkDraft, LoadedDocument, RecursiveSplitter};
use tracing::{debug, info};

use super::similarity::rank_top_k;
use super::{MetadataFilter, VectorIndex};
use crate::embeddings::Embedder;

#[derive(Debug, Clone)]
struct UploadEntry {
    ordinal: u32,
    chunk: RetrievedChunk,
    vector: Vec<f32>,
}

/// In-memory index over a single uploaded document. Lives only as long as
/// the session that built it.
///
/// Chunks carry the upload's file name under `source` but no
/// `source_document`, so sources display as the upload label.
#[derive(Debug, Clone)]
pub struct UploadIndex {
    document_name: String,
    model: String,
    entries: Vec<UploadEntry>,
}

impl UploadIndex {
    pub fn build(
        embedder: &dyn Embedder,
        model: &str,
        doc: &LoadedDocument,
        splitter: &RecursiveSplitter,
    ) -> Result<Self, AppError> {
        Self::from_chunks(embedder, model, &doc.name, splitter.split_document(doc))
    }

    pub fn from_chunks(
        embedder: &dyn Embedder,
        model: &str,
        document_name: &str,
        drafts: Vec<ChunkDraft>,
    ) -> Result<Self, AppError> {
        if drafts.is_empty() {
            return Err(AppError::new(
                "INDEX_DOCUMENT_INVALID",
                "Uploaded document produced no chunks",
            )
            .with_details(format!("document={document_name}")));
        }

        let mut entries: Vec<UploadEntry> = Vec::with_capacity(drafts.len());
        for d in drafts {
            let vector = embedder.embed(model, &d.text)?;
            if let Some(first) = entries.first() {
                if first.vector.len() != vector.len() {
                    return Err(AppError::new(
                        "INDEX_DIMS_MISMATCH",
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!(
                        "expected={}; got={}; ordinal={}",
                        first.vector.len(),
                        vector.len(),
                        d.ordinal
                    )));
                }
            }
            let mut chunk = RetrievedChunk::new(d.text);
            chunk
                .metadata
                .insert("source".to_string(), document_name.to_string());
            chunk
                .metadata
                .insert("ordinal".to_string(), d.ordinal.to_string());
            entries.push(UploadEntry {
                ordinal: d.ordinal,
                chunk,
                vector,
            });
        }

        info!(document = document_name, chunks = entries.len(), "built upload index");
        Ok(Self {
            document_name: document_name.to_string(),
            model: model.to_string(),
            entries,
        })
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl VectorIndex for UploadIndex {
    fn supports_filtering(&self) -> bool {
        false
    }

    fn similarity_search(
        &self,
        embedder: &dyn Embedder,
        model: &str,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        if filter.is_some() {
            debug!(document = self.document_name.as_str(), "upload index ignores filters");
        }
        if model != self.model {
            return Err(AppError::new(
                "INDEX_MODEL_MISMATCH",
                "Upload index was built with a different embedding model",
            )
            .with_details(format!("index_model={}; requested={model}", self.model)));
        }

        let qv = embedder.embed(model, query)?;
        let hits = rank_top_k(
            &qv,
            self.entries.iter().map(|e| (&e.ordinal, e.vector.as_slice())),
            k,
        )?;

        let mut out = Vec::with_capacity(hits.len());
        for (ordinal, _score) in hits {
            if let Some(e) = self.entries.iter().find(|e| e.ordinal == ordinal) {
                out.push(e.chunk.clone());
            }
        }
        Ok(out)
    }
}
