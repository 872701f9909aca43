use rfq_core::config::Settings;
use rfq_core::domain::{QueryResult, RetrievedChunk, SourceRecord};
use rfq_core::error::AppError;
use rfq_core::scope::ALL_DOCUMENTS;
use tracing::{debug, error, warn};

use crate::embeddings::Embedder;
use crate::index::{MetadataFilter, VectorIndex};
use crate::llm::CompletionProvider;
use crate::prompts::PromptTemplate;

mod context;

pub use context::{build_context, ContextBlock, CONTEXT_DELIMITER};

pub const NO_RELEVANT_INFORMATION: &str =
    "No relevant information found in the selected documents for your query.";
pub const BACKEND_UNAVAILABLE: &str =
    "Error: A required backend component (vector store, embeddings, or LLM) is not initialized.";
pub const ERROR_PREFIX: &str = "An error occurred in the backend while processing your RAG query: ";

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOptions {
    pub top_k: usize,
    /// `None` joins every retrieved chunk into the prompt.
    pub max_context_chars: Option<usize>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_context_chars: Some(DEFAULT_MAX_CONTEXT_CHARS),
        }
    }
}

impl RetrievalOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.top_k,
            max_context_chars: settings.max_context_chars,
        }
    }
}

/// Model handles and names for one query. Built by the caller; nothing here
/// is global.
#[derive(Clone, Copy)]
pub struct Backends<'a> {
    pub embedder: Option<&'a dyn Embedder>,
    pub completion: Option<&'a dyn CompletionProvider>,
    pub embedding_model: &'a str,
    pub completion_model: &'a str,
    pub retrieval: RetrievalOptions,
}

/// Typed result of [`run_query`]. [`answer_query`] flattens it into the UI
/// shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered(QueryResult),
    NoMatches,
    BackendUnavailable,
    Failed(AppError),
}

impl QueryOutcome {
    pub fn into_result(self) -> QueryResult {
        match self {
            QueryOutcome::Answered(r) => r,
            QueryOutcome::NoMatches => QueryResult::message_only(NO_RELEVANT_INFORMATION),
            QueryOutcome::BackendUnavailable => QueryResult::message_only(BACKEND_UNAVAILABLE),
            QueryOutcome::Failed(e) => {
                QueryResult::message_only(format!("{ERROR_PREFIX}{}", e.describe()))
            }
        }
    }
}

/// Build the equality filter for a scope, if any applies to this index.
/// The name is matched exactly as given.
pub fn scope_predicate(index: &dyn VectorIndex, scope_filter: Option<&str>) -> Option<MetadataFilter> {
    let name = scope_filter.filter(|s| !s.is_empty() && *s != ALL_DOCUMENTS)?;
    if !index.supports_filtering() {
        debug!(scope = name, "index does not support filtering; searching all chunks");
        return None;
    }
    Some(MetadataFilter::source_document(name))
}

pub fn run_query(
    question: &str,
    index: Option<&dyn VectorIndex>,
    backends: &Backends<'_>,
    template: &PromptTemplate,
    scope_filter: Option<&str>,
) -> QueryOutcome {
    let (Some(index), Some(embedder), Some(completion)) =
        (index, backends.embedder, backends.completion)
    else {
        warn!(
            index = index.is_some(),
            embedder = backends.embedder.is_some(),
            completion = backends.completion.is_some(),
            "query backend not initialized"
        );
        return QueryOutcome::BackendUnavailable;
    };

    match answer_with(question, index, embedder, completion, backends, template, scope_filter) {
        Ok(Some(result)) => QueryOutcome::Answered(result),
        Ok(None) => QueryOutcome::NoMatches,
        Err(e) => {
            error!(
                code = e.code.as_str(),
                message = e.message.as_str(),
                details = e.details.as_deref().unwrap_or(""),
                "query failed"
            );
            QueryOutcome::Failed(e)
        }
    }
}

/// Answer a question in the renderable UI shape. Never fails: missing
/// handles, empty retrievals and errors all become a message-only result.
pub fn answer_query(
    question: &str,
    index: Option<&dyn VectorIndex>,
    backends: &Backends<'_>,
    template: &PromptTemplate,
    scope_filter: Option<&str>,
) -> QueryResult {
    run_query(question, index, backends, template, scope_filter).into_result()
}

fn answer_with(
    question: &str,
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    completion: &dyn CompletionProvider,
    backends: &Backends<'_>,
    template: &PromptTemplate,
    scope_filter: Option<&str>,
) -> Result<Option<QueryResult>, AppError> {
    let filter = scope_predicate(index, scope_filter);
    debug!(
        k = backends.retrieval.top_k,
        filter = filter.as_ref().map(|f| f.value.as_str()).unwrap_or(""),
        "retrieving"
    );

    let chunks: Vec<RetrievedChunk> = index.similarity_search(
        embedder,
        backends.embedding_model,
        question,
        backends.retrieval.top_k,
        filter.as_ref(),
    )?;
    if chunks.is_empty() {
        return Ok(None);
    }
    debug!(retrieved = chunks.len(), "retrieved chunks for context");

    let context = build_context(&chunks, backends.retrieval.max_context_chars);
    let prompt = template.render(&[("context", context.text.as_str()), ("question", question)])?;

    debug!(model = backends.completion_model, prompt_chars = prompt.len(), "sending prompt");
    let completion = completion.complete(backends.completion_model, &prompt)?;

    Ok(Some(QueryResult {
        answer: completion.content,
        sources_for_ui: chunks.iter().map(SourceRecord::from).collect(),
    }))
}
