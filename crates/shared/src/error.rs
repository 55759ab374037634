use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Network,
    Decoding,
    InvalidUrl,
}

/// Error body returned by the API on non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decoding(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl RepositoryError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding(message.into())
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network(_) | Self::Api { .. } => ErrorCode::Network,
            Self::Decoding(_) => ErrorCode::Decoding,
            Self::InvalidUrl(_) => ErrorCode::InvalidUrl,
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}
