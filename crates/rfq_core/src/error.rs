use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by every crate in the workspace.
///
/// Codes are grouped by prefix: `CONFIG_*`, `INGEST_*`, `INDEX_*`, `AI_*`,
/// `QUERY_*`. Transport failures are marked retryable so a caller can decide
/// whether to offer "try again"; nothing in the workspace retries on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new("CONFIG_INVALID", message)
    }

    /// Message plus details, the form shown inline to an end user.
    pub fn describe(&self) -> String {
        match self.details.as_deref() {
            Some(d) if !d.is_empty() => format!("{} ({d})", self.message),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
