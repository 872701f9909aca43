use std::time::Duration;

use rfq_core::error::AppError;
use serde::Deserialize;

use super::{bounded_input, Embedder};
use crate::provider::AzureOpenAiClient;

#[derive(Debug, Clone)]
pub struct AzureOpenAiEmbedder {
    client: AzureOpenAiClient,
}

impl AzureOpenAiEmbedder {
    pub fn new(client: AzureOpenAiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

impl Embedder for AzureOpenAiEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let url = self.client.deployment_url(model, "embeddings");
        let body = serde_json::json!({ "input": bounded_input(input) });
        let resp: EmbeddingsResponse = self.client.post(
            &url,
            body,
            Duration::from_secs(10),
            "AI_EMBEDDINGS_FAILED",
            "embeddings",
        )?;

        let embedding = resp
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .unwrap_or_default();
        if embedding.is_empty() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response was empty",
            )
            .with_details(format!("deployment={model}")));
        }
        Ok(embedding)
    }
}
