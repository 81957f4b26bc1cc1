//! Unified error type for the axis workspace.

use http::HeaderMap;
use thiserror::Error;

/// Enumerates all error kinds that can occur across axis crates.
#[derive(Debug, Error)]
pub enum AxisError {
    /// The request never reached the server or no response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The underlying HTTP call exceeded its time ceiling.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The server rejected the credentials and no refresh is permitted for
    /// this request (e.g. a call to the token endpoint itself).
    #[error("unauthorized: status={status}, body={body}")]
    Unauthorized { status: u16, body: String },

    /// The session could not be renewed; local credentials have been cleared.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// Any other non-success response, passed through unmodified.
    #[error("api error: status={status}, body={body}")]
    Domain {
        status: u16,
        body: String,
        headers: Box<HeaderMap>,
    },

    /// The request description could not be turned into an HTTP call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistent session storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The task replaying a queued request went away before answering.
    #[error("request cancelled before completion")]
    Cancelled,
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AxisError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl AxisError {
    /// Returns `true` if the server rejected the presented credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::SessionExpired(_))
    }

    /// Returns `true` if no response was received at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Domain { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response headers carried by a [`AxisError::Domain`] error, e.g. `Retry-After`.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Domain { headers, .. } => Some(&**headers),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AxisError>;
