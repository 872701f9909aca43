use std::time::Duration;

use rfq_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{non_empty, Completion, CompletionProvider};
use crate::provider::{send_json, OllamaClient};

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl CompletionProvider for OllamaLlm {
    fn complete(&self, model: &str, prompt: &str) -> Result<Completion, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: 0.1 },
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new("AI_COMPLETION_FAILED", "Failed to encode completion request")
                .with_details(e.to_string())
        })?;

        let v: GenerateResponse = send_json(
            ureq::post(&url).timeout(Duration::from_secs(60)),
            body,
            "AI_COMPLETION_FAILED",
            "completion",
        )?;
        non_empty(Completion::new(v.response), model)
    }
}
