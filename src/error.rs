//! Error types for the finance chat agent

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Configuration Errors
    // =============================

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Key '{0}' not found in the environment variables")]
    MissingEnv(String),

    #[error("Unsupported model name: {0}")]
    UnsupportedModel(String),

    // =============================
    // Request Pipeline Errors
    // =============================

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("LLM provider returned {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Stream error: {0}")]
    StreamError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
