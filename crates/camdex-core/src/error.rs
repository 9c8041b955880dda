//! Error types for camdex.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using IndexError.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while managing or querying the camera index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The index file does not exist yet.
    #[error("index not found at {}", path.display())]
    IndexNotFound { path: PathBuf },

    /// The query had no searchable tokens.
    #[error("query has no searchable tokens")]
    EmptyQuery,

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The selected profile is missing from the config file.
    #[error("profile {name:?} not found in {}", path.display())]
    ProfileNotFound { name: String, path: PathBuf },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The remote API answered with an error status.
    #[error("request failed with status {status}")]
    RemoteStatus { status: u16 },

    /// The remote API answered with something that is not camera JSON.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    /// Create an index-not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::IndexNotFound { path: path.into() }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Create an unexpected-response error.
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Whether this error means the index has not been built yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IndexNotFound { .. })
    }

    /// Get a stable error code for JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            Self::EmptyQuery => "EMPTY_QUERY",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            Self::Http { .. } => "HTTP_ERROR",
            Self::RemoteStatus { .. } => "REMOTE_STATUS",
            Self::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
