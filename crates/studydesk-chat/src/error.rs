//! Error types for document chat.

use thiserror::Error;

/// Result type alias for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors from a chat turn or its collaborators.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The question was empty or whitespace.
    #[error("query must not be empty")]
    EmptyQuery,

    /// Context retrieval failed.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Failed to read a local document.
    #[error("failed to read document '{path}': {source}")]
    ReadDocument {
        path: String,
        source: std::io::Error,
    },

    /// The model returned an error or an unusable response.
    #[error("model error: {0}")]
    Model(String),

    /// The model endpoint rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The model endpoint is rate limiting us.
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    /// Transport failure talking to the model endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}
