//! Error types for the rotamap crawler
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream site refused the request (403/429)
    #[error("Request blocked with status {0}")]
    Blocked(u16),

    /// The response body is a bot-challenge page, not catalog content
    #[error("Bot challenge page returned instead of content")]
    Challenge,

    /// The response body was empty
    #[error("Empty response body")]
    EmptyBody,

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,
}

impl FetchError {
    /// Whether this failure looks like the site blocking us rather than an
    /// ordinary transport problem.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Blocked(_) | Self::Challenge | Self::EmptyBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_classification() {
        assert!(FetchError::Blocked(403).is_block());
        assert!(FetchError::Blocked(429).is_block());
        assert!(FetchError::Challenge.is_block());
        assert!(FetchError::EmptyBody.is_block());
        assert!(!FetchError::Timeout.is_block());
        assert!(!FetchError::ServerError(500).is_block());
        assert!(!FetchError::MaxRetriesExceeded.is_block());
    }
}
