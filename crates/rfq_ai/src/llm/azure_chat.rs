use std::time::Duration;

use rfq_core::error::AppError;
use serde::Deserialize;

use super::{non_empty, Completion, CompletionProvider, CompletionResponse};
use crate::provider::AzureOpenAiClient;

#[derive(Debug, Clone)]
pub struct AzureChatLlm {
    client: AzureOpenAiClient,
    temperature: f32,
}

impl AzureChatLlm {
    pub fn new(client: AzureOpenAiClient) -> Self {
        Self {
            client,
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: CompletionResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

impl CompletionProvider for AzureChatLlm {
    fn complete(&self, model: &str, prompt: &str) -> Result<Completion, AppError> {
        let url = self.client.deployment_url(model, "chat/completions");
        let body = serde_json::json!({
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });
        let resp: ChatResponse = self.client.post(
            &url,
            body,
            Duration::from_secs(60),
            "AI_COMPLETION_FAILED",
            "chat completion",
        )?;

        let choice = resp.choices.into_iter().next().ok_or_else(|| {
            AppError::new("AI_COMPLETION_FAILED", "Chat completion returned no choices")
                .with_details(format!("deployment={model}"))
        })?;
        non_empty(Completion::from(choice.message), model)
    }
}
