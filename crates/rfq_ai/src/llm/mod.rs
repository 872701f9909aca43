use rfq_core::error::AppError;
use serde::{Deserialize, Serialize};

pub mod azure_chat;
pub mod ollama_llm;

/// Generated text, normalized by the provider so callers never inspect the
/// wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Message payloads seen from chat endpoints: an object with a `content`
/// field, or a bare string. The structured form wins when both would parse.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CompletionResponse {
    Structured { content: String },
    Text(String),
}

impl From<CompletionResponse> for Completion {
    fn from(resp: CompletionResponse) -> Self {
        match resp {
            CompletionResponse::Structured { content } => Self { content },
            CompletionResponse::Text(content) => Self { content },
        }
    }
}

pub trait CompletionProvider {
    fn complete(&self, model: &str, prompt: &str) -> Result<Completion, AppError>;
}

pub(crate) fn non_empty(completion: Completion, model: &str) -> Result<Completion, AppError> {
    if completion.content.trim().is_empty() {
        return Err(
            AppError::new("AI_COMPLETION_FAILED", "Completion response was empty")
                .with_details(format!("model={model}")),
        );
    }
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_structured_and_plain_responses() {
        let structured: CompletionResponse =
            serde_json::from_str(r####"{"role":"assistant","content":"### Deadlines"}"####)
                .expect("structured");
        assert_eq!(Completion::from(structured).content, "### Deadlines");

        let plain: CompletionResponse = serde_json::from_str(r#""plain answer""#).expect("plain");
        assert_eq!(Completion::from(plain).content, "plain answer");

        assert!(serde_json::from_str::<CompletionResponse>(r#"{"role":"assistant"}"#).is_err());
    }

    #[test]
    fn blank_completions_are_rejected() {
        let err = non_empty(Completion::new("  \n"), "mock").expect_err("blank");
        assert_eq!(err.code, "AI_COMPLETION_FAILED");
        assert!(non_empty(Completion::new("ok"), "mock").is_ok());
    }
}
