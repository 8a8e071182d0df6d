//! Error types for subtitle providers.

use thiserror::Error;

/// Errors raised by a single subtitle provider.
///
/// None of these abort a search: the provider pool logs them, records them
/// in the [`SearchReport`](super::SearchReport) and moves on.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Provider is missing credentials or rejected them.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Could not reach the provider.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Provider asked us to slow down.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimited,

    /// Provider answered with a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Response body could not be understood.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Download step failed after a successful search.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Downloaded content was empty.
    #[error("Downloaded subtitle is empty")]
    EmptyContent,
}

impl ProviderError {
    /// Creates an API error, keeping only the start of the response body.
    pub fn api_error(status: u16, body: &str) -> Self {
        Self::ApiError {
            status,
            message: body.chars().take(200).collect(),
        }
    }

    /// Creates a parse error.
    pub fn parse(reason: impl std::fmt::Display) -> Self {
        Self::ParseError(reason.to_string())
    }

    /// Whether the failure is about infrastructure rather than the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) | Self::Timeout | Self::RateLimited => true,
            Self::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::ConnectionFailed(e.to_string())
        }
    }
}
