//! Async traits shared across all axis crates.
//!
//! Every collaborator of the authenticated client is defined here so that
//! higher layers depend only on `axis-types`, not on each other.

use crate::{AccessToken, ApiResponse, OutboundRequest};
use async_trait::async_trait;

pub use crate::error::Result;

/// Persistent storage for the access token.
///
/// The refresh (rotation) credential is never seen by this layer; it travels
/// out-of-band with the transport.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the current access token, if any.
    async fn load(&self) -> Result<Option<AccessToken>>;
    /// Replace the stored access token.
    async fn save(&self, token: &AccessToken) -> Result<()>;
    /// Forget the stored access token.
    async fn clear(&self) -> Result<()>;
}

/// Holder of the currently selected tenant (organization/client) identifier.
///
/// Set by user action elsewhere; the client only reads it, and clears it when
/// the session ends.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn current(&self) -> Result<Option<String>>;
    async fn set(&self, tenant: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Performs exactly one HTTP exchange.
///
/// Implementations return the response for every status code; only a missing
/// response (network failure, timeout) is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AxisError::Transport`](crate::AxisError::Transport) or
    /// [`AxisError::Timeout`](crate::AxisError::Timeout) when no response arrives.
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse>;
}

/// Process-wide "the session has ended" signal.
pub trait LogoutHandler: Send + Sync {
    fn on_logout(&self);
}

impl<F> LogoutHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_logout(&self) {
        self();
    }
}
