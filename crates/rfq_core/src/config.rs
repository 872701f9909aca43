use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Ollama,
    Azure,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "azure" => Ok(Self::Azure),
            other => Err(AppError::config("Unknown provider")
                .with_details(format!("RFQ_PROVIDER={other}; expected ollama|azure"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IndexKind {
    Local,
    AzureSearch,
}

impl FromStr for IndexKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "azure-search" | "azure_search" => Ok(Self::AzureSearch),
            other => Err(AppError::config("Unknown index backend")
                .with_details(format!("RFQ_INDEX={other}; expected local|azure-search"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureOpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureSearchSettings {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitterSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub provider: ProviderKind,
    pub ollama_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    /// Present only when endpoint and key are both configured.
    pub azure_openai: Option<AzureOpenAiSettings>,
    pub index: IndexKind,
    pub data_dir: PathBuf,
    pub azure_search: Option<AzureSearchSettings>,
    /// Document names offered as focus choices for the remote index, which
    /// cannot list its own documents.
    pub remote_documents: Vec<String>,
    pub top_k: usize,
    /// `None` disables the context budget.
    pub max_context_chars: Option<usize>,
    pub splitter: SplitterSettings,
    pub log_filter: String,
}

impl Settings {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is the common case.
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match get("RFQ_PROVIDER") {
            Some(v) => v.parse()?,
            None => ProviderKind::Ollama,
        };
        let index = match get("RFQ_INDEX") {
            Some(v) => v.parse()?,
            None => IndexKind::Local,
        };

        let azure_openai = match (get("AZURE_OPENAI_ENDPOINT"), get("AZURE_OPENAI_API_KEY")) {
            (Some(endpoint), Some(api_key)) => Some(AzureOpenAiSettings {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key,
                api_version: get("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            }),
            _ => None,
        };

        let azure_search = match (
            get("AZURE_AI_SEARCH_ENDPOINT"),
            get("AZURE_AI_SEARCH_KEY"),
            get("AZURE_AI_SEARCH_INDEX_NAME"),
        ) {
            (Some(endpoint), Some(api_key), Some(index_name)) => Some(AzureSearchSettings {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key,
                index_name,
            }),
            _ => None,
        };

        let (default_embed, default_chat) = match provider {
            ProviderKind::Ollama => ("nomic-embed-text", "llama3.1"),
            ProviderKind::Azure => ("text-embedding-ada-002", "gpt-4o"),
        };
        let embedding_model = match provider {
            ProviderKind::Azure => get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT"),
            ProviderKind::Ollama => None,
        }
        .or_else(|| get("RFQ_EMBEDDING_MODEL"))
        .unwrap_or_else(|| default_embed.to_string());
        let chat_model = match provider {
            ProviderKind::Azure => get("AZURE_OPENAI_CHAT_DEPLOYMENT"),
            ProviderKind::Ollama => None,
        }
        .or_else(|| get("RFQ_CHAT_MODEL"))
        .unwrap_or_else(|| default_chat.to_string());

        let top_k = parse_usize(&get, "RFQ_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(AppError::config("Retrieval k must be at least 1")
                .with_details("RFQ_TOP_K=0"));
        }
        let max_context_chars =
            match parse_usize(&get, "RFQ_MAX_CONTEXT_CHARS", DEFAULT_MAX_CONTEXT_CHARS)? {
                0 => None,
                n => Some(n),
            };

        let splitter = SplitterSettings {
            chunk_size: parse_usize(&get, "RFQ_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_usize(&get, "RFQ_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
        };
        if splitter.chunk_size == 0 || splitter.chunk_overlap >= splitter.chunk_size {
            return Err(AppError::config("Chunk overlap must be smaller than chunk size")
                .with_details(format!(
                    "chunk_size={}; chunk_overlap={}",
                    splitter.chunk_size, splitter.chunk_overlap
                )));
        }

        Ok(Self {
            provider,
            ollama_base_url: get("RFQ_OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
            embedding_model,
            chat_model,
            azure_openai,
            index,
            data_dir: get("RFQ_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".insightrfq")),
            azure_search,
            remote_documents: get("RFQ_REMOTE_DOCUMENTS")
                .map(|v| parse_name_list(&v))
                .unwrap_or_default(),
            top_k,
            max_context_chars,
            splitter,
            log_filter: get("RFQ_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// `;`-separated document names. Names may contain commas and spaces.
fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_usize<G>(get: &G, key: &str, default: usize) -> Result<usize, AppError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<usize>().map_err(|e| {
            AppError::config("Expected a non-negative integer")
                .with_details(format!("{key}={raw}; err={e}"))
        }),
    }
}
