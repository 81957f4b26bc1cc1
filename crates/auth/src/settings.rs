//! Resolved client settings.

use axis_config::Config;
use axis_types::{AxisError, traits::Result};
use http::HeaderName;
use std::time::Duration;
use url::Url;

/// Everything the client needs from [`Config`], parsed once.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub refresh_timeout: Duration,
    pub refresh_path: String,
    pub login_path: String,
    pub tenant_header: HeaderName,
}

impl ClientSettings {
    /// # Errors
    ///
    /// Returns [`AxisError::Config`] if the base URL or tenant header is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let tenant_header = HeaderName::from_bytes(config.tenant_header.as_bytes())
            .map_err(|e| AxisError::Config(format!("tenant_header: {e}")))?;
        Ok(Self {
            base_url: config.base_url()?,
            request_timeout: config.request_timeout(),
            refresh_timeout: config.refresh_timeout(),
            refresh_path: config.refresh_path.clone(),
            login_path: config.login_path.clone(),
            tenant_header,
        })
    }

    /// Resolve `path` under the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::InvalidRequest`] if the path does not parse or
    /// escapes the base URL (absolute URLs, `..` segments).
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AxisError::InvalidRequest(format!("path {path:?}: {e}")))?;
        if !url.as_str().starts_with(self.base_url.as_str()) {
            return Err(AxisError::InvalidRequest(format!(
                "path {path:?} resolves outside {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Whether `path` names the token endpoint.
    #[must_use]
    pub fn is_refresh_path(&self, path: &str) -> bool {
        let normalise = |p: &str| p.trim_matches('/').to_string();
        normalise(path) == normalise(&self.refresh_path)
    }
}
