use thiserror::Error;

/// Terminal failures of the credential refresh protocol.
///
/// Cloneable so every request queued behind a refresh receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Refresh rejected (status {status}): {message}")]
    RefreshRejected { status: u16, message: String },
    #[error("Refresh abandoned before it settled")]
    RefreshAbandoned,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
