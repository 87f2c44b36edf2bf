//! Error types for the assessment service.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Request-level rejections. Messages are shown to the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Content-Type must be application/json")]
    UnsupportedMediaType,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimited,
}

impl SubmissionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SubmissionError::InvalidInput(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        SubmissionError::Unauthorized(message.into())
    }
}

/// Submission log errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outbound email errors. Never fail a submission.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Missing email credential: {0}")]
    MissingCredential(String),

    #[error("Failed to sign service account token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{stage} rejected with status {status}: {body}")]
    Rejected {
        stage: &'static str,
        status: u16,
        body: String,
    },
}

/// HTTP listener errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
