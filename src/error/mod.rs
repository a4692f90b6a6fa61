//! Error types for the LMS client.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum LmsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Auth(#[from] AuthError),
}

impl LmsError {
    /// Create an API error for a non-success status.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => Self::Unauthorized(body.to_string()),
            403 => Self::Forbidden(body.to_string()),
            429 => Self::RateLimited {
                retry_after_ms: extract_retry_after(body),
            },
            other => Self::api(other, body),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => ErrorCategory::Transport,
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorCategory::Authorization,
            Self::Auth(_) => ErrorCategory::SessionExpired,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }

    /// Whether a caller may reasonably retry the same action later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::RateLimit | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::Timeout(_) => RecoverySuggestion::IncreaseTimeout,
            Self::Forbidden(_) => RecoverySuggestion::CheckPermissions,
            _ => match self.category() {
                ErrorCategory::Authorization | ErrorCategory::SessionExpired => {
                    RecoverySuggestion::SignInAgain
                }
                ErrorCategory::Transport | ErrorCategory::RateLimit | ErrorCategory::Server => {
                    RecoverySuggestion::RetryWithBackoff
                }
                ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
                _ => RecoverySuggestion::ContactSupport,
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LmsError>;

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .or_else(|| v.get("retryAfter"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
