//! Error classification and recovery hints.

/// Broad error category used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network unreachable or timed out; never triggers a refresh.
    Transport,
    /// The backend rejected the credential (401) or the action (403).
    Authorization,
    /// The credential refresh failed; the session has been torn down.
    SessionExpired,
    RateLimit,
    Server,
    Api,
    Configuration,
    Serialization,
}

/// Suggested recovery action for UI-level callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    SignInAgain,
    CheckPermissions,
    CheckConfiguration,
    IncreaseTimeout,
    ContactSupport,
}
