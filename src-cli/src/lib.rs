use std::path::{Path, PathBuf};

use rfq_ai::embeddings::azure_embed::AzureOpenAiEmbedder;
use rfq_ai::embeddings::ollama_embed::OllamaEmbedder;
use rfq_ai::embeddings::Embedder;
use rfq_ai::index::{AzureSearchIndex, CorpusAddInput, CorpusIndex, UploadIndex, VectorIndex};
use rfq_ai::llm::azure_chat::AzureChatLlm;
use rfq_ai::llm::ollama_llm::OllamaLlm;
use rfq_ai::llm::CompletionProvider;
use rfq_ai::prompts::{rfp_prompt, PromptTemplate};
use rfq_ai::provider::{AzureOpenAiClient, OllamaClient};
use rfq_ai::query::{run_query, Backends, QueryOutcome, RetrievalOptions};
use rfq_ai::session::{resolve_target, UploadSession};
use rfq_core::config::{IndexKind, ProviderKind, Settings};
use rfq_core::domain::QueryResult;
use rfq_core::error::AppError;
use rfq_core::ingest::{load_document, RecursiveSplitter};
use rfq_core::present::{sources_markdown, suggested_follow_ups};
use rfq_core::scope::focus_options;
use rfq_core::now_rfc3339_utc;
use tracing::{info, warn};

#[derive(Debug, serde::Serialize)]
pub struct IndexedFile {
    pub document_name: String,
    pub chunks: usize,
    pub embedded: u32,
    pub reused: u32,
    pub removed: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct AskRequest {
    pub question: String,
    pub focus: Option<String>,
    pub upload: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct AskResponse {
    #[serde(flatten)]
    pub result: QueryResult,
    pub follow_ups: Vec<String>,
    /// Error code when the answer is a rendered failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Configured handles for one process. Providers that cannot be configured
/// are absent rather than failing startup; queries then report the backend
/// as unavailable.
pub struct App {
    settings: Settings,
    embedder: Option<Box<dyn Embedder>>,
    completion: Option<Box<dyn CompletionProvider>>,
    template: PromptTemplate,
}

impl App {
    pub fn from_settings(settings: Settings) -> Result<Self, AppError> {
        let (embedder, completion) = match settings.provider {
            ProviderKind::Ollama => {
                let client = OllamaClient::new(&settings.ollama_base_url)?;
                let embedder: Box<dyn Embedder> = Box::new(OllamaEmbedder::new(client.clone()));
                let completion: Box<dyn CompletionProvider> = Box::new(OllamaLlm::new(client));
                (Some(embedder), Some(completion))
            }
            ProviderKind::Azure => match settings.azure_openai.as_ref() {
                Some(azure) => {
                    let client = AzureOpenAiClient::new(azure)?;
                    let embedder: Box<dyn Embedder> =
                        Box::new(AzureOpenAiEmbedder::new(client.clone()));
                    let completion: Box<dyn CompletionProvider> =
                        Box::new(AzureChatLlm::new(client));
                    (Some(embedder), Some(completion))
                }
                None => {
                    warn!("AZURE_OPENAI_ENDPOINT or AZURE_OPENAI_API_KEY not set; embeddings and chat unavailable");
                    (None, None)
                }
            },
        };
        Self::with_providers(settings, embedder, completion)
    }

    pub fn with_providers(
        settings: Settings,
        embedder: Option<Box<dyn Embedder>>,
        completion: Option<Box<dyn CompletionProvider>>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            settings,
            embedder,
            completion,
            template: rfp_prompt()?,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn local_corpus(&self) -> Result<CorpusIndex, AppError> {
        match self.settings.index {
            IndexKind::Local => Ok(CorpusIndex::open(self.settings.data_dir.clone())),
            IndexKind::AzureSearch => Err(AppError::config(
                "The Azure AI Search corpus is maintained outside this tool",
            )
            .with_details("RFQ_INDEX=azure-search")),
        }
    }

    fn corpus(&self) -> Result<Option<Box<dyn VectorIndex>>, AppError> {
        match self.settings.index {
            IndexKind::Local => Ok(Some(Box::new(CorpusIndex::open(
                self.settings.data_dir.clone(),
            )))),
            IndexKind::AzureSearch => match self.settings.azure_search.as_ref() {
                Some(s) => Ok(Some(Box::new(AzureSearchIndex::new(s)?))),
                None => {
                    warn!("Azure AI Search settings incomplete; corpus index unavailable");
                    Ok(None)
                }
            },
        }
    }

    fn require_embedder(&self) -> Result<&dyn Embedder, AppError> {
        self.embedder.as_deref().ok_or_else(|| {
            AppError::new("AI_PROVIDER_UNAVAILABLE", "No embedding provider is configured")
        })
    }

    fn splitter(&self) -> Result<RecursiveSplitter, AppError> {
        RecursiveSplitter::from_settings(&self.settings.splitter)
    }

    /// Load, split and add each file to the local corpus under its file name.
    pub fn index_files(&self, paths: &[PathBuf]) -> Result<Vec<IndexedFile>, AppError> {
        let corpus = self.local_corpus()?;
        let embedder = self.require_embedder()?;
        let splitter = self.splitter()?;

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let doc = load_document(path)?;
            let chunks = splitter.split_document(&doc);
            let chunk_count = chunks.len();
            let res = corpus.add_document(
                embedder,
                CorpusAddInput {
                    model: self.settings.embedding_model.clone(),
                    document_name: doc.name.clone(),
                    chunks,
                    updated_at: now_rfc3339_utc()?,
                },
            )?;
            out.push(IndexedFile {
                document_name: doc.name,
                chunks: chunk_count,
                embedded: res.embedded,
                reused: res.reused,
                removed: res.removed,
            });
        }
        Ok(out)
    }

    /// Focus choices: the whole-corpus sentinel, then each indexed document.
    /// The remote index lists the configured document names.
    pub fn documents(&self) -> Result<Vec<String>, AppError> {
        let indexed = match self.settings.index {
            IndexKind::Local => self.local_corpus()?.documents()?,
            IndexKind::AzureSearch => self.settings.remote_documents.clone(),
        };
        Ok(focus_options(&indexed, None))
    }

    pub fn ask(&self, req: &AskRequest) -> Result<AskResponse, AppError> {
        let corpus = self.corpus()?;
        let mut session = UploadSession::new();
        let mut focus = req.focus.clone();

        if let Some(path) = req.upload.as_deref() {
            let name = self.upload(&mut session, path)?;
            if focus.is_none() {
                focus = Some(name);
            }
        }

        let target = resolve_target(focus.as_deref(), corpus.as_deref(), &session);
        let backends = Backends {
            embedder: self.embedder.as_deref(),
            completion: self.completion.as_deref(),
            embedding_model: &self.settings.embedding_model,
            completion_model: &self.settings.chat_model,
            retrieval: RetrievalOptions::from_settings(&self.settings),
        };

        let outcome = run_query(
            &req.question,
            target.index,
            &backends,
            &self.template,
            target.scope_filter.as_deref(),
        );
        let error_code = match &outcome {
            QueryOutcome::Failed(e) => Some(e.code.clone()),
            _ => None,
        };
        Ok(AskResponse {
            result: outcome.into_result(),
            follow_ups: suggested_follow_ups(),
            error_code,
        })
    }

    /// Build the session's upload index. Without an embedder nothing is
    /// built and the query later reports the backend as unavailable.
    fn upload(&self, session: &mut UploadSession, path: &Path) -> Result<String, AppError> {
        let doc = load_document(path)?;
        let name = doc.name.clone();
        let Some(embedder) = self.embedder.as_deref() else {
            warn!(document = name.as_str(), "no embedding provider; upload not indexed");
            return Ok(name);
        };
        let splitter = self.splitter()?;
        session.replace_with(&name, || {
            UploadIndex::build(embedder, &self.settings.embedding_model, &doc, &splitter)
        })?;
        info!(document = name.as_str(), "upload ready");
        Ok(name)
    }

    pub fn health(&self) -> Result<HealthStatus, AppError> {
        match self.settings.provider {
            ProviderKind::Ollama => {
                let client = OllamaClient::new(&self.settings.ollama_base_url)?;
                client.health_check()?;
                Ok(HealthStatus {
                    ok: true,
                    message: format!("Ollama reachable at {}", client.base_url()),
                })
            }
            ProviderKind::Azure => Ok(match self.settings.azure_openai.as_ref() {
                Some(a) => HealthStatus {
                    ok: true,
                    message: format!("Azure OpenAI configured at {}", a.endpoint),
                },
                None => HealthStatus {
                    ok: false,
                    message: "Azure OpenAI endpoint or key missing".to_string(),
                },
            }),
        }
    }
}

/// Answer, sources and follow-ups as terminal Markdown.
pub fn render_answer(resp: &AskResponse) -> String {
    let mut out = resp.result.answer.trim_end().to_string();
    if !resp.result.sources_for_ui.is_empty() {
        out.push_str("\n\n**Sources**\n\n");
        out.push_str(&sources_markdown(&resp.result.sources_for_ui));
    }
    if !resp.follow_ups.is_empty() {
        out.push_str("\n\n**Suggested follow-ups**\n");
        for q in &resp.follow_ups {
            out.push_str("\n- ");
            out.push_str(q);
        }
    }
    out.push('\n');
    out
}
