use axis_types::{AxisError, error::Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_refresh_path() -> String {
    "auth/token/refresh/".to_string()
}
fn default_login_path() -> String {
    "auth/token/".to_string()
}
fn default_tenant_header() -> String {
    "X-Client-Id".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API base; request paths resolve under it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Ceiling on every underlying HTTP call (defaults to 30).
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Ceiling on the refresh call; also bounds how long queued requests wait.
    #[serde(default = "default_timeout_secs")]
    pub refresh_timeout_secs: u64,
    /// Token endpoint, relative to `base_url`.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Credential login endpoint, relative to `base_url`.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Header carrying the tenant context.
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
    /// SQLite session file used by the CLI (default: `~/.axis/session.db`).
    #[serde(default)]
    pub session_db: Option<PathBuf>,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
            refresh_timeout_secs: default_timeout_secs(),
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
            tenant_header: default_tenant_header(),
            session_db: None,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Config`] if the YAML is invalid, extraction fails,
    /// or the result does not pass [`Config::validate`].
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::extract(Figment::from(Serialized::defaults(Config::default())).merge(Yaml::string(yaml)))
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        Self::extract(Figment::from(Serialized::defaults(Config::default())).merge(Yaml::file(path)))
    }

    /// Defaults, then the optional YAML file, then `AXIS_*` environment
    /// variables (`__` separates nested keys, e.g. `AXIS_LOG__LEVEL`).
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Config`] on any parse or validation failure.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::extract(figment.merge(Env::prefixed("AXIS_").split("__")))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| AxisError::Config(e.to_string()))?;
        config.validate()?;
        tracing::debug!(base_url = %config.base_url, "configuration loaded");
        Ok(config)
    }

    /// Checks that the base URL parses and timeouts are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.request_timeout_secs == 0 {
            return Err(AxisError::Config("request_timeout_secs must be > 0".into()));
        }
        if self.refresh_timeout_secs == 0 {
            return Err(AxisError::Config("refresh_timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// The base URL, normalised to end with `/` so relative paths join under it.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Config`] if `base_url` is not an absolute URL.
    pub fn base_url(&self) -> Result<Url> {
        let raw = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        let url = Url::parse(&raw).map_err(|e| AxisError::Config(format!("base_url {raw:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(AxisError::Config(format!("base_url {raw:?} cannot be a base")));
        }
        Ok(url)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}
