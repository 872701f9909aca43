use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use rfq_core::domain::{sha256_hex, RetrievedChunk, SOURCE_DOCUMENT_KEY};
use rfq_core::error::AppError;
use rfq_core::ingest::ChunkDraft;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::similarity::rank_top_k;
use super::{MetadataFilter, VectorIndex};
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusIndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub document_count: u32,
    pub updated_at: Option<String>,
}

impl Default for CorpusIndexStatus {
    fn default() -> Self {
        Self {
            ready: false,
            model: None,
            dims: None,
            chunk_count: 0,
            document_count: 0,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusAddInput {
    pub model: String,
    pub document_name: String,
    pub chunks: Vec<ChunkDraft>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusAddResult {
    pub status: CorpusIndexStatus,
    pub embedded: u32,
    pub reused: u32,
    pub removed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct CorpusChunkRecord {
    chunk_id: String,
    source_document: String,
    ordinal: u32,
    text: String,
    text_sha256: String,
}

impl CorpusChunkRecord {
    fn to_retrieved(&self) -> RetrievedChunk {
        let mut chunk = RetrievedChunk::new(self.text.clone())
            .with_source_document(self.source_document.clone());
        chunk
            .metadata
            .insert("chunk_id".to_string(), self.chunk_id.clone());
        chunk
            .metadata
            .insert("ordinal".to_string(), self.ordinal.to_string());
        chunk
    }
}

/// Persistent, filterable index of the shared tender corpus.
///
/// Layout under `<root>/index/`: `corpus_status.json`, `corpus_chunks.json`
/// (chunk_id -> record) and `corpus_vectors.json` (chunk_id -> vector). Chunk
/// ids are content-derived, so re-adding an unchanged document embeds nothing.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    root: PathBuf,
}

impl CorpusIndex {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    fn status_path(&self) -> PathBuf {
        self.index_dir().join("corpus_status.json")
    }

    fn chunks_path(&self) -> PathBuf {
        self.index_dir().join("corpus_chunks.json")
    }

    fn vectors_path(&self) -> PathBuf {
        self.index_dir().join("corpus_vectors.json")
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.index_dir()).map_err(|e| {
            AppError::new("INDEX_WRITE_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.index_dir().display(), e))
        })
    }

    pub fn status(&self) -> Result<CorpusIndexStatus, AppError> {
        read_json_or_default(&self.status_path(), "index status")
    }

    fn read_chunks(&self) -> Result<BTreeMap<String, CorpusChunkRecord>, AppError> {
        read_json_or_default(&self.chunks_path(), "index chunks")
    }

    fn read_vectors(&self) -> Result<BTreeMap<String, Vec<f32>>, AppError> {
        read_json_or_default(&self.vectors_path(), "index vectors")
    }

    /// Names of every indexed document, sorted.
    pub fn documents(&self) -> Result<Vec<String>, AppError> {
        let names: BTreeSet<String> = self
            .read_chunks()?
            .into_values()
            .map(|r| r.source_document)
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Replace one document's chunks, embedding only chunks whose text is new.
    pub fn add_document(
        &self,
        embedder: &dyn Embedder,
        input: CorpusAddInput,
    ) -> Result<CorpusAddResult, AppError> {
        self.ensure_dirs()?;

        let name = input.document_name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::new(
                "INDEX_DOCUMENT_INVALID",
                "Document name is required",
            ));
        }
        if input.chunks.is_empty() {
            return Err(AppError::new(
                "INDEX_DOCUMENT_INVALID",
                "Document produced no chunks",
            )
            .with_details(format!("document={name}")));
        }

        let current = self.status()?;
        if let Some(existing) = current.model.as_deref() {
            if current.ready && existing != input.model {
                return Err(AppError::new(
                    "INDEX_MODEL_MISMATCH",
                    "Corpus index was built with a different embedding model",
                )
                .with_details(format!("index_model={existing}; requested={}", input.model)));
            }
        }

        let mut chunks = self.read_chunks()?;
        let mut vectors = self.read_vectors()?;

        let incoming: Vec<CorpusChunkRecord> = input
            .chunks
            .iter()
            .map(|d| {
                let text_sha256 = sha256_hex(d.text.as_bytes());
                let chunk_id = sha256_hex(
                    format!("v1|{}|{}|{}", name, d.ordinal, text_sha256).as_bytes(),
                );
                CorpusChunkRecord {
                    chunk_id,
                    source_document: name.clone(),
                    ordinal: d.ordinal,
                    text: d.text.clone(),
                    text_sha256,
                }
            })
            .collect();
        let wanted: BTreeSet<&str> = incoming.iter().map(|r| r.chunk_id.as_str()).collect();

        let stale: Vec<String> = chunks
            .values()
            .filter(|r| r.source_document == name && !wanted.contains(r.chunk_id.as_str()))
            .map(|r| r.chunk_id.clone())
            .collect();
        for id in stale.iter() {
            chunks.remove(id);
            vectors.remove(id);
        }

        let mut dims: Option<u32> = if current.ready { current.dims } else { None };
        let mut embedded = 0u32;
        let mut reused = 0u32;
        for rec in incoming {
            if vectors.contains_key(&rec.chunk_id) {
                reused += 1;
            } else {
                let v = embedder.embed(&input.model, &rec.text).map_err(|e| {
                    AppError::new("AI_EMBEDDINGS_FAILED", "Failed to compute embeddings")
                        .with_details(format!("document={name}; ordinal={}; err={}", rec.ordinal, e))
                        .with_retryable(e.retryable)
                })?;
                let this_dims = v.len() as u32;
                match dims {
                    Some(d) if d != this_dims => {
                        return Err(AppError::new(
                            "INDEX_DIMS_MISMATCH",
                            "Embedding dimension mismatch across chunks",
                        )
                        .with_details(format!(
                            "expected={d}; got={this_dims}; document={name}; ordinal={}",
                            rec.ordinal
                        )));
                    }
                    Some(_) => {}
                    None => dims = Some(this_dims),
                }
                vectors.insert(rec.chunk_id.clone(), v);
                embedded += 1;
            }
            chunks.insert(rec.chunk_id.clone(), rec);
        }

        // Only write after every embedding succeeded.
        write_json_atomic(&self.vectors_path(), &vectors, "index vectors")?;
        write_json_atomic(&self.chunks_path(), &chunks, "index chunks")?;
        let status = self.write_status(&chunks, Some(input.model), dims, input.updated_at)?;

        info!(
            document = name.as_str(),
            embedded,
            reused,
            removed = stale.len(),
            "indexed document"
        );
        Ok(CorpusAddResult {
            status,
            embedded,
            reused,
            removed: stale.len() as u32,
        })
    }

    pub fn remove_document(&self, name: &str, updated_at: &str) -> Result<CorpusIndexStatus, AppError> {
        self.ensure_dirs()?;
        let current = self.status()?;
        let mut chunks = self.read_chunks()?;
        let mut vectors = self.read_vectors()?;

        let before = chunks.len();
        chunks.retain(|_, r| r.source_document != name);
        vectors.retain(|id, _| chunks.contains_key(id));
        if chunks.len() == before {
            return Err(AppError::new("INDEX_DOCUMENT_NOT_FOUND", "Document is not indexed")
                .with_details(format!("document={name}")));
        }

        write_json_atomic(&self.vectors_path(), &vectors, "index vectors")?;
        write_json_atomic(&self.chunks_path(), &chunks, "index chunks")?;
        self.write_status(&chunks, current.model, current.dims, updated_at.to_string())
    }

    fn write_status(
        &self,
        chunks: &BTreeMap<String, CorpusChunkRecord>,
        model: Option<String>,
        dims: Option<u32>,
        updated_at: String,
    ) -> Result<CorpusIndexStatus, AppError> {
        let documents: BTreeSet<&str> = chunks.values().map(|r| r.source_document.as_str()).collect();
        let status = CorpusIndexStatus {
            ready: !chunks.is_empty(),
            model,
            dims,
            chunk_count: chunks.len() as u32,
            document_count: documents.len() as u32,
            updated_at: Some(updated_at),
        };
        write_json_atomic(&self.status_path(), &status, "index status")?;
        Ok(status)
    }
}

impl VectorIndex for CorpusIndex {
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
        let status = self.status()?;
        if !status.ready {
            debug!("corpus index is empty");
            return Ok(Vec::new());
        }
        if status.model.as_deref() != Some(model) {
            return Err(AppError::new(
                "INDEX_MODEL_MISMATCH",
                "Corpus index was built with a different embedding model",
            )
            .with_details(format!(
                "index_model={}; requested={model}",
                status.model.unwrap_or_default()
            )));
        }

        let chunks = self.read_chunks()?;
        let vectors = self.read_vectors()?;
        let candidates: Vec<(&String, &[f32])> = chunks
            .values()
            .filter(|r| match filter {
                Some(f) if f.field == SOURCE_DOCUMENT_KEY => r.source_document == f.value,
                Some(f) => f.matches(&r.to_retrieved().metadata),
                None => true,
            })
            .filter_map(|r| vectors.get(&r.chunk_id).map(|v| (&r.chunk_id, v.as_slice())))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let qv = embedder.embed(model, query)?;
        let hits = rank_top_k(&qv, candidates, k)?;

        let mut out = Vec::with_capacity(hits.len());
        for (chunk_id, _score) in hits {
            let rec = chunks.get(&chunk_id).ok_or_else(|| {
                AppError::new("INDEX_CORRUPT", "Index vector has no chunk record")
                    .with_details(format!("chunk_id={chunk_id}"))
            })?;
            out.push(rec.to_retrieved());
        }
        Ok(out)
    }
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<T, AppError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("INDEX_READ_FAILED", format!("Failed to read {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new("INDEX_READ_FAILED", format!("Failed to decode {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_vec_pretty(value).map_err(|e| {
        AppError::new("INDEX_WRITE_FAILED", format!("Failed to encode {what}"))
            .with_details(e.to_string())
    })?;
    fs::write(&tmp, &json).map_err(|e| {
        AppError::new("INDEX_WRITE_FAILED", format!("Failed to write {what}"))
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new("INDEX_WRITE_FAILED", format!("Failed to finalize {what} write"))
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}
