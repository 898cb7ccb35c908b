use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a test-management backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Credential rejected by the service.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Addressed resource does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Service asked us to back off.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Transport-level failure (DNS, TLS, connect, read).
    #[error("network error: {message}")]
    Network { message: String },

    /// Service answered with a non-success payload.
    #[error("remote api error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteError {
    /// Whether the transport layer may retry the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }
}
