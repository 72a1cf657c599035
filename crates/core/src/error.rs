//! Error types for the Teidaishu domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the top-level [`Error`]
//! wraps them so a single failure propagates unchanged to the caller.
//!
//! Key-derivation misses and content-store misses are deliberately absent:
//! they are `None` values, not errors.

use thiserror::Error;

/// The top-level error type for all Teidaishu operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Client input ---
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // --- Upstream collaborators ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Content store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the request itself rather than an
    /// upstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::MalformedInput(_))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Embedding response malformed: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding service not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Index query failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Index rejected query: {0}")]
    Rejected(String),

    #[error("Index response malformed: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Index not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Failed to read {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Object store request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Generation request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Generation response malformed: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Generation service not configured: {0}")]
    NotConfigured(String),
}
