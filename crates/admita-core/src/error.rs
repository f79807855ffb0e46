//! Error types for admita

use thiserror::Error;

/// Result type alias using AdmitaError
pub type Result<T> = std::result::Result<T, AdmitaError>;

/// Error type alias for convenience
pub type Error = AdmitaError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNAVAILABLE: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for admita
#[derive(Debug, Error)]
pub enum AdmitaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AdmitaError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) => exit_codes::INVALID_INPUT,
            Self::Generation(_) | Self::Retrieval(_) | Self::ExternalError(_) => {
                exit_codes::UNAVAILABLE
            }
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
