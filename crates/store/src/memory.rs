//! In-memory stores backed by `ArcSwapOption` for lock-free reads.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axis_types::{AccessToken, TenantStore, TokenStore, traits::Result};
use std::sync::Arc;

/// An in-memory [`TokenStore`] for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: ArcSwapOption<AccessToken>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<AccessToken>) -> Self {
        let token: AccessToken = token.into();
        Self {
            token: ArcSwapOption::from_pointee(token),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Result<Option<AccessToken>> {
        Ok(self.token.load_full().map(|t| (*t).clone()))
    }

    async fn save(&self, token: &AccessToken) -> Result<()> {
        self.token.store(Some(Arc::new(token.clone())));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.token.store(None);
        Ok(())
    }
}

/// An in-memory [`TenantStore`].
#[derive(Default)]
pub struct InMemoryTenantStore {
    tenant: ArcSwapOption<String>,
}

impl InMemoryTenantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tenant(tenant: impl Into<String>) -> Self {
        let tenant: String = tenant.into();
        Self {
            tenant: ArcSwapOption::from_pointee(tenant),
        }
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn current(&self) -> Result<Option<String>> {
        Ok(self.tenant.load_full().map(|t| (*t).clone()))
    }

    async fn set(&self, tenant: &str) -> Result<()> {
        self.tenant.store(Some(Arc::new(tenant.to_string())));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.tenant.store(None);
        Ok(())
    }
}
