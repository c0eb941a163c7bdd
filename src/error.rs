//! Error types for the Barguni client

use crate::request::ApiResponse;
use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A failed response whose error code is not the expired-token sentinel.
    /// The response is kept exactly as the server sent it.
    #[error("Upstream request failed with status {}", .0.status)]
    Upstream(Box<ApiResponse>),

    /// Only surfaced by clients that do not recover from expired tokens.
    #[error("Token expired")]
    TokenExpired,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// The upstream response carried by an [`ClientError::Upstream`] error
    pub fn upstream_response(&self) -> Option<&ApiResponse> {
        match self {
            ClientError::Upstream(response) => Some(response),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
