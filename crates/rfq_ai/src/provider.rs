use std::time::Duration;

use rfq_core::config::AzureOpenAiSettings;
use rfq_core::error::AppError;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for a local Ollama daemon (`127.0.0.1` or `localhost`).
    /// Remote inference goes through the Azure provider instead.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let reject = |reason: &str| {
            AppError::new(
                "AI_REMOTE_NOT_ALLOWED",
                "Ollama base URL must be a local http address",
            )
            .with_details(format!("base_url={base_url}; reason={reason}"))
        };

        let authority = base_url
            .strip_prefix("http://")
            .ok_or_else(|| reject("scheme must be http"))?;
        let (host, port) = match authority.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (authority, None),
        };
        if host != "127.0.0.1" && host != "localhost" {
            return Err(reject("host must be 127.0.0.1 or localhost"));
        }
        if let Some(p) = port {
            match p.parse::<u16>() {
                Ok(n) if n != 0 => {}
                _ => return Err(reject("invalid port")),
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new("AI_OLLAMA_UNREACHABLE", "Failed to reach Ollama")
                .with_details(e.to_string())
                .with_retryable(true)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AzureOpenAiClient {
    pub fn new(settings: &AzureOpenAiSettings) -> Result<Self, AppError> {
        let endpoint = settings.endpoint.trim().trim_end_matches('/').to_string();
        if !endpoint.starts_with("https://") {
            return Err(AppError::new(
                "AI_PROVIDER_INVALID",
                "Azure OpenAI endpoint must use https",
            )
            .with_details(format!("endpoint={endpoint}")));
        }
        if settings.api_key.trim().is_empty() {
            return Err(AppError::new("AI_PROVIDER_INVALID", "Azure OpenAI API key is empty"));
        }
        Ok(Self {
            endpoint,
            api_key: settings.api_key.clone(),
            api_version: settings.api_version.clone(),
        })
    }

    /// `{endpoint}/openai/deployments/{deployment}/{operation}?api-version=...`
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment, operation, self.api_version
        )
    }

    pub(crate) fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: serde_json::Value,
        timeout: Duration,
        code: &'static str,
        what: &str,
    ) -> Result<T, AppError> {
        let req = ureq::post(url)
            .timeout(timeout)
            .set("api-key", &self.api_key);
        send_json(req, body, code, what)
    }
}

/// POST a JSON body and decode a 200 response, mapping every failure mode to
/// `code`. 429 and 5xx statuses are marked retryable.
pub(crate) fn send_json<T: DeserializeOwned>(
    req: ureq::Request,
    body: serde_json::Value,
    code: &'static str,
    what: &str,
) -> Result<T, AppError> {
    match req.send_json(body) {
        Ok(r) if r.status() == 200 => r.into_json::<T>().map_err(|e| {
            AppError::new(code, format!("Failed to decode {what} response"))
                .with_details(e.to_string())
        }),
        Ok(r) => Err(AppError::new(code, format!("{what} request failed"))
            .with_details(format!("status={}", r.status()))),
        Err(ureq::Error::Status(status, r)) => {
            let body = r.into_string().unwrap_or_default();
            let body: String = body.chars().take(300).collect();
            Err(AppError::new(code, format!("{what} request failed"))
                .with_details(format!("status={status}; body={body}"))
                .with_retryable(status == 429 || status >= 500))
        }
        Err(e) => Err(AppError::new(code, format!("Failed to call {what} endpoint"))
            .with_details(e.to_string())
            .with_retryable(true)),
    }
}
