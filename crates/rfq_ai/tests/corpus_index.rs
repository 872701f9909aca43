use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rfq_ai::embeddings::Embedder;
use rfq_ai::index::{CorpusAddInput, CorpusIndex, MetadataFilter, VectorIndex};
use rfq_core::error::AppError;
use rfq_core::ingest::ChunkDraft;

/// Keyword-presence vectors: [deadline, users, bbee, bias].
struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = input.to_lowercase();
        let has = |w: &str| if lower.contains(w) { 1.0 } else { 0.0 };
        Ok(vec![has("deadline"), has("users"), has("b-bbee"), 0.1])
    }
}

fn drafts(texts: &[&str]) -> Vec<ChunkDraft> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| ChunkDraft {
            ordinal: i as u32,
            text: t.to_string(),
        })
        .collect()
}

fn add(index: &CorpusIndex, embedder: &dyn Embedder, name: &str, texts: &[&str]) -> rfq_ai::index::CorpusAddResult {
    index
        .add_document(
            embedder,
            CorpusAddInput {
                model: "nomic-embed-text".to_string(),
                document_name: name.to_string(),
                chunks: drafts(texts),
                updated_at: "2026-10-01T00:00:00Z".to_string(),
            },
        )
        .expect("add_document")
}

#[test]
fn readds_embed_only_changed_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = CorpusIndex::open(dir.path().to_path_buf());
    let embedder = KeywordEmbedder::new();

    let first = add(&index, &embedder, "DocA.pdf", &["Deadline is May 1st", "Must support 50 users"]);
    assert_eq!((first.embedded, first.reused, first.removed), (2, 0, 0));
    assert!(first.status.ready);
    assert_eq!(first.status.dims, Some(4));
    assert_eq!(embedder.call_count(), 2);

    let again = add(&index, &embedder, "DocA.pdf", &["Deadline is May 1st", "Must support 50 users"]);
    assert_eq!((again.embedded, again.reused, again.removed), (0, 2, 0));
    assert_eq!(embedder.call_count(), 2);

    let edited = add(&index, &embedder, "DocA.pdf", &["Deadline is May 1st", "Must support 80 users"]);
    assert_eq!((edited.embedded, edited.reused, edited.removed), (1, 1, 1));
    assert_eq!(edited.status.chunk_count, 2);
    assert_eq!(embedder.call_count(), 3);
}

#[test]
fn search_ranks_and_filters_by_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = CorpusIndex::open(dir.path().to_path_buf());
    let embedder = KeywordEmbedder::new();
    add(&index, &embedder, "DocA.pdf", &["Deadline is May 1st", "Must support 50 users"]);
    add(&index, &embedder, "DocB.docx", &["Final deadline for questions", "Needs B-BBEE Level 2"]);

    assert_eq!(index.documents().expect("documents"), vec!["DocA.pdf", "DocB.docx"]);
    assert_eq!(index.status().expect("status").document_count, 2);

    let all = index
        .similarity_search(&embedder, "nomic-embed-text", "deadline?", 2, None)
        .expect("search");
    let texts: Vec<&str> = all.iter().map(|c| c.page_content.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&"Deadline is May 1st"));
    assert!(texts.contains(&"Final deadline for questions"));

    let only_b = index
        .similarity_search(
            &embedder,
            "nomic-embed-text",
            "deadline?",
            3,
            Some(&MetadataFilter::source_document("DocB.docx")),
        )
        .expect("search");
    assert_eq!(only_b.len(), 2);
    assert_eq!(only_b[0].page_content, "Final deadline for questions");
    assert!(only_b.iter().all(|c| c.source_document() == Some("DocB.docx")));
}

#[test]
fn empty_index_returns_no_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = CorpusIndex::open(dir.path().to_path_buf());
    let embedder = KeywordEmbedder::new();
    let hits = index
        .similarity_search(&embedder, "nomic-embed-text", "anything", 3, None)
        .expect("search");
    assert!(hits.is_empty());
    assert_eq!(embedder.call_count(), 0);
}

#[test]
fn remove_document_drops_its_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = CorpusIndex::open(dir.path().to_path_buf());
    let embedder = KeywordEmbedder::new();
    add(&index, &embedder, "DocA.pdf", &["Deadline is May 1st"]);
    add(&index, &embedder, "DocB.docx", &["Needs B-BBEE Level 2"]);

    let st = index
        .remove_document("DocA.pdf", "2026-10-02T00:00:00Z")
        .expect("remove");
    assert_eq!(st.document_count, 1);
    assert_eq!(index.documents().expect("documents"), vec!["DocB.docx"]);

    let err = index
        .remove_document("DocA.pdf", "2026-10-02T00:00:00Z")
        .expect_err("already removed");
    assert_eq!(err.code, "INDEX_DOCUMENT_NOT_FOUND");
}

#[test]
fn rejects_a_different_embedding_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = CorpusIndex::open(dir.path().to_path_buf());
    let embedder = KeywordEmbedder::new();
    add(&index, &embedder, "DocA.pdf", &["Deadline is May 1st"]);

    let err = index
        .add_document(
            &embedder,
            CorpusAddInput {
                model: "text-embedding-ada-002".to_string(),
                document_name: "DocB.pdf".to_string(),
                chunks: drafts(&["x"]),
                updated_at: "2026-10-01T00:00:00Z".to_string(),
            },
        )
        .expect_err("model mismatch");
    assert_eq!(err.code, "INDEX_MODEL_MISMATCH");

    let err = index
        .similarity_search(&embedder, "text-embedding-ada-002", "deadline", 3, None)
        .expect_err("model mismatch");
    assert_eq!(err.code, "INDEX_MODEL_MISMATCH");
}

#[test]
fn rejects_documents_without_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = CorpusIndex::open(dir.path().to_path_buf());
    let err = index
        .add_document(
            &KeywordEmbedder::new(),
            CorpusAddInput {
                model: "nomic-embed-text".to_string(),
                document_name: "Empty.pdf".to_string(),
                chunks: vec![],
                updated_at: "2026-10-01T00:00:00Z".to_string(),
            },
        )
        .expect_err("no chunks");
    assert_eq!(err.code, "INDEX_DOCUMENT_INVALID");
}
