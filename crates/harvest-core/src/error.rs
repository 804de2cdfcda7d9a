use thiserror::Error;

/// Application-wide error types for harvest.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (fetching a feed page).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Remote content store rejected or failed a write.
    #[error("Upload error (HTTP {status_code}): {message}")]
    UploadError {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// A page snapshot could not be turned into post elements at all.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Delimited-text encoding of a batch failed.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Missing or invalid configuration (credentials, collection parameters).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Local filesystem operation failed.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::UploadError { retryable, .. } => *retryable,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError(e.to_string())
    }
}
