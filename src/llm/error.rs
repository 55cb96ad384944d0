//! Backend invocation errors
//!
//! `BackendError` covers every way a call into the generative backend can fail
//! before its output reaches the normalization or directive checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur while invoking the model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Authentication failed or credentials are invalid
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Rate limit exceeded, retry after the specified duration (in seconds)
    RateLimitError { retry_after: Option<u64> },

    /// The backend answered, but not with something usable
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing API keys, invalid settings, etc.)
    ConfigurationError { message: String },

    /// Network-related error
    NetworkError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl BackendError {
    /// Whether repeating the same request later could plausibly succeed.
    ///
    /// Retry policy itself belongs to the caller; this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::TimeoutError { .. }
            | BackendError::RateLimitError { .. }
            | BackendError::NetworkError { .. }
            | BackendError::InvalidResponse { .. } => true,
            BackendError::ApiError { status_code, .. } => {
                status_code.map_or(true, |code| code >= 500)
            }
            BackendError::AuthenticationError { .. }
            | BackendError::ConfigurationError { .. }
            | BackendError::Other { .. } => false,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::RateLimitError { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from model: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}
