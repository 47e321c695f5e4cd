//! Error types for the agentdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use serde::Serialize;
use thiserror::Error;

/// The top-level error type for all agentdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Client errors ---
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl Error {
    /// Classify this error for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::Client,
            Self::Provider(
                ProviderError::AuthenticationFailed(_) | ProviderError::NotConfigured(_),
            ) => ErrorKind::Configuration,
            Self::Provider(_) => ErrorKind::Dependency,
        }
    }

    /// Convert into the serializable error envelope.
    pub fn to_result(&self) -> ErrorResult {
        ErrorResult {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller sent something unusable (blank query, missing agent id).
    Client,
    /// The process is misconfigured (missing credential, bad config file).
    Configuration,
    /// The model provider failed or timed out.
    Dependency,
}

/// A failed request as seen by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResult {
    pub kind: ErrorKind,
    pub message: String,
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}
