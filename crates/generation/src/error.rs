//! Error types for remote generation

use thiserror::Error;

/// Result type for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failures of story, cover or speech generation
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No API key configured; set the {0} environment variable")]
    MissingApiKey(String),

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    /// The response parsed but did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No audio data received from the speech service")]
    MissingAudio,

    #[error("No image data received from the cover service")]
    MissingImage,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Returns true if repeating the request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the service rejected the request itself (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, GenerationError::Api { status, .. } if (400..500).contains(status))
    }
}
