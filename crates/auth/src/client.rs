//! Authenticated API client with transparent, single-flight token refresh.
//!
//! Every call gets `Authorization: Bearer <token>` and the tenant header when
//! those are present. A 401 on an ordinary request parks the request in the
//! [`RefreshGate`]; the first one to park starts the refresh. Once the refresh
//! settles each parked request is either replayed once with the new token or
//! rejected with [`AxisError::SessionExpired`]. Callers only see the final
//! outcome.
//!
//! The refresh and the replays run on spawned tasks, so a caller abandoning
//! its future never strands the gate in `Refreshing`.
//!
//! Ending a session is latched: however many requests are rejected at once,
//! the stores are cleared and the logout signal fires a single time. The
//! latch re-arms on login and on every successful refresh.

use crate::{
    gate::{PendingRequest, RefreshGate, RefreshState},
    settings::ClientSettings,
    token::{Credentials, parse_token_response},
};
use axis_types::{
    AccessToken, ApiRequest, ApiResponse, AxisError, LogoutHandler, OutboundRequest, TenantStore,
    TokenStore, Transport, traits::Result,
};
use http::{HeaderMap, HeaderValue, Method, header::AUTHORIZATION};
use serde::Serialize;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Cheaply cloneable handle; clones share the token store, tenant store and gate.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

struct Inner {
    settings: ClientSettings,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    tenant: Arc<dyn TenantStore>,
    logout: Arc<dyn LogoutHandler>,
    gate: RefreshGate,
    session_ended: AtomicBool,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl AuthenticatedClient {
    pub fn new(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        tenant: Arc<dyn TenantStore>,
        logout: Arc<dyn LogoutHandler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                transport,
                tokens,
                tenant,
                logout,
                gate: RefreshGate::new(),
                session_ended: AtomicBool::new(false),
            }),
        }
    }

    /// Perform one API call.
    ///
    /// # Errors
    ///
    /// - [`AxisError::Transport`] / [`AxisError::Timeout`] when no response arrived.
    /// - [`AxisError::SessionExpired`] when the token could not be renewed or
    ///   was rejected again after renewal.
    /// - [`AxisError::Unauthorized`] for a 401 on an authentication endpoint.
    /// - [`AxisError::Domain`] for any other non-2xx response.
    /// - [`AxisError::InvalidRequest`] if the path escapes the base URL.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.inner.execute(request).await?.error_for_status()
    }

    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(ApiRequest::get(path)).await
    }

    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn patch<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(ApiRequest::patch(path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(ApiRequest::delete(path)).await
    }

    /// Exchange credentials for an access token and store it.
    ///
    /// The rotation credential comes back as a cookie and stays with the transport.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Unauthorized`] for rejected credentials, or any
    /// transport/storage error.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let request = ApiRequest::post(self.inner.settings.login_path.clone())
            .json(credentials)?
            .without_auth();
        let (response, _) = self.inner.send_once(&request).await?;
        let token = parse_token_response(&response)?;
        self.inner.tokens.save(&token).await?;
        self.inner.session_ended.store(false, Ordering::Release);
        tracing::info!(email = %credentials.email, "logged in");
        Ok(())
    }

    /// Clear the token and tenant and raise the logout signal.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; the logout signal fires regardless.
    pub async fn logout(&self) -> Result<()> {
        tracing::info!("logging out");
        self.inner.session_ended.store(true, Ordering::Release);
        self.inner.end_session().await
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn refresh_state(&self) -> RefreshState {
        self.inner.gate.state()
    }

    /// The refresh guard, for diagnostics.
    #[must_use]
    pub fn gate(&self) -> &RefreshGate {
        &self.inner.gate
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("base_url", &self.inner.settings.base_url.as_str())
            .field("refresh_state", &self.inner.gate.state())
            .finish_non_exhaustive()
    }
}

impl Inner {
    async fn execute(self: &Arc<Self>, request: ApiRequest) -> Result<ApiResponse> {
        let (response, presented) = self.send_once(&request).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }
        if request.skip_auth || self.settings.is_refresh_path(&request.path) {
            return Err(AxisError::Unauthorized {
                status: response.status.as_u16(),
                body: response.text(),
            });
        }

        // A refresh already replaced the token this request carried.
        let current = self.tokens.load().await?;
        if current.is_some() && current != presented {
            tracing::debug!(path = %request.path, "token rotated while in flight, replaying");
            return self.replay(&request).await;
        }

        let (pending, reply) = PendingRequest::new(request);
        if self.gate.try_begin_refresh(pending) {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.run_refresh().await });
        }
        reply.await.unwrap_or(Err(AxisError::Cancelled))
    }

    /// Attach credentials and issue one HTTP call. Returns the response and
    /// the token it carried.
    async fn send_once(&self, request: &ApiRequest) -> Result<(ApiResponse, Option<AccessToken>)> {
        let url = self.settings.resolve(&request.path)?;
        let mut headers = request.headers.clone();

        let token = if request.skip_auth {
            None
        } else {
            self.tokens.load().await?
        };
        if let Some(token) = &token {
            let mut value = HeaderValue::from_str(&token.bearer()).map_err(|e| {
                AxisError::InvalidRequest(format!("access token is not a valid header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(tenant) = self.tenant.current().await? {
            let value = HeaderValue::from_str(&tenant).map_err(|e| {
                AxisError::InvalidRequest(format!("tenant {tenant:?} is not a valid header value: {e}"))
            })?;
            headers.insert(self.settings.tenant_header.clone(), value);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            bearer = token.is_some(),
            "sending request"
        );
        let response = self
            .transport
            .send(OutboundRequest {
                method: request.method.clone(),
                url,
                headers,
                body: request.body.clone(),
                timeout: self.settings.request_timeout,
            })
            .await?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            "response received"
        );
        Ok((response, token))
    }

    /// Second and final attempt for a request; a 401 here ends the session.
    async fn replay(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let (response, _) = self.send_once(request).await?;
        if response.is_unauthorized() {
            tracing::warn!(path = %request.path, "request rejected after token refresh");
            self.expire_session().await;
            return Err(AxisError::SessionExpired(
                "access token rejected after refresh".into(),
            ));
        }
        Ok(response)
    }

    async fn run_refresh(self: Arc<Self>) {
        tracing::info!("access token rejected, refreshing");
        match self.refresh_token().await {
            Ok(()) => {
                let pending = self.gate.complete_refresh();
                tracing::info!(queued = pending.len(), "access token refreshed, replaying queued requests");
                for entry in pending {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        let outcome = this.replay(&entry.request).await;
                        entry.settle(outcome);
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed");
                // Clear the stale token while late 401s still queue behind the gate.
                self.expire_session().await;
                let pending = self.gate.complete_refresh();
                let cause = e.to_string();
                for entry in pending {
                    entry.settle(Err(AxisError::SessionExpired(cause.clone())));
                }
            }
        }
    }

    /// POST the token endpoint (no body, no bearer) and store the new token.
    async fn refresh_token(&self) -> Result<()> {
        let request = OutboundRequest {
            method: Method::POST,
            url: self.settings.resolve(&self.settings.refresh_path)?,
            headers: HeaderMap::new(),
            body: None,
            timeout: self.settings.request_timeout,
        };
        let limit = self.settings.refresh_timeout;
        let response = tokio::time::timeout(limit, self.transport.send(request))
            .await
            .map_err(|_| AxisError::Timeout {
                timeout_ms: millis(limit),
            })??;
        let token = parse_token_response(&response)?;
        self.tokens.save(&token).await?;
        self.session_ended.store(false, Ordering::Release);
        Ok(())
    }

    async fn end_session(&self) -> Result<()> {
        let tokens = self.tokens.clear().await;
        let tenant = self.tenant.clear().await;
        self.logout.on_logout();
        tokens.and(tenant)
    }

    /// End the session unless another rejection already did.
    async fn expire_session(&self) {
        if self.session_ended.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::warn!("ending session");
        if let Err(e) = self.end_session().await {
            tracing::warn!(error = %e, "failed to clear session state");
        }
    }
}
