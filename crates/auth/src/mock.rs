//! Scripted in-process API used by the client tests.

use async_trait::async_trait;
use axis_types::{
    AccessToken, ApiResponse, AxisError, OutboundRequest, TokenStore, Transport, traits::Result,
};
use http::{Method, StatusCode, header::AUTHORIZATION};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Notify;

pub const BASE_URL: &str = "http://api.test/api/";
pub const REFRESH_PATH: &str = "auth/token/refresh/";
pub const LOGIN_PATH: &str = "auth/token/";
pub const TENANT_HEADER: &str = "x-client-id";

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub tenant: Option<String>,
}

/// Accepts exactly one bearer token; the refresh endpoint rotates it.
///
/// Special paths: `boom/` (500), `missing/` (404), `invalid/` (422),
/// `forbidden/` (403), `revoked/` (always 401), `down/` (transport error),
/// `slow/` (timeout), `rotate/` (rotates the stored token mid-request, then 401).
pub struct MockApi {
    accepted: Mutex<String>,
    issues: String,
    refresh_ok: AtomicBool,
    hold: Mutex<Option<Arc<Notify>>>,
    rotate_into: Mutex<Option<Arc<dyn TokenStore>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new(accepted: &str) -> Self {
        Self {
            accepted: Mutex::new(accepted.to_string()),
            issues: "T2".to_string(),
            refresh_ok: AtomicBool::new(true),
            hold: Mutex::new(None),
            rotate_into: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_refresh(self) -> Self {
        self.refresh_ok.store(false, Ordering::SeqCst);
        self
    }

    /// Make the refresh endpoint wait until `release` is notified.
    pub fn holding_refresh(self, release: Arc<Notify>) -> Self {
        *self.hold.lock().unwrap() = Some(release);
        self
    }

    pub fn rotating_into(self, store: Arc<dyn TokenStore>) -> Self {
        *self.rotate_into.lock().unwrap() = Some(store);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls_to(REFRESH_PATH).len()
    }

    fn json(status: StatusCode, value: &serde_json::Value) -> ApiResponse {
        ApiResponse::new(status, value.to_string())
    }

    async fn refresh(&self) -> ApiResponse {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(release) = hold {
            release.notified().await;
        }
        if self.refresh_ok.load(Ordering::SeqCst) {
            *self.accepted.lock().unwrap() = self.issues.clone();
            Self::json(StatusCode::OK, &serde_json::json!({ "access": self.issues }))
        } else {
            Self::json(
                StatusCode::UNAUTHORIZED,
                &serde_json::json!({ "detail": "token_not_valid" }),
            )
        }
    }

    fn authorized(&self, call: &Call) -> bool {
        let expected = format!("Bearer {}", self.accepted.lock().unwrap());
        call.authorization.as_deref() == Some(expected.as_str())
    }
}

#[async_trait]
impl Transport for MockApi {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
        let path = request
            .url
            .path()
            .trim_start_matches("/api/")
            .to_string();
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let call = Call {
            method: request.method.clone(),
            path: path.clone(),
            authorization: header(AUTHORIZATION.as_str()),
            tenant: header(TENANT_HEADER),
        };
        self.calls.lock().unwrap().push(call.clone());

        let unauthorized = || {
            Self::json(
                StatusCode::UNAUTHORIZED,
                &serde_json::json!({ "detail": "token_not_valid" }),
            )
        };

        Ok(match path.as_str() {
            REFRESH_PATH => self.refresh().await,
            LOGIN_PATH => {
                let password = request
                    .body
                    .as_ref()
                    .and_then(|b| b.get("password"))
                    .and_then(serde_json::Value::as_str);
                if password == Some("secret") {
                    *self.accepted.lock().unwrap() = "T1".to_string();
                    Self::json(StatusCode::OK, &serde_json::json!({ "access": "T1" }))
                } else {
                    unauthorized()
                }
            }
            "boom/" => ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "server exploded"),
            "missing/" => ApiResponse::new(StatusCode::NOT_FOUND, "not found"),
            "invalid/" => Self::json(
                StatusCode::UNPROCESSABLE_ENTITY,
                &serde_json::json!({ "name": ["This field is required."] }),
            ),
            "forbidden/" => ApiResponse::new(StatusCode::FORBIDDEN, "forbidden"),
            "revoked/" => unauthorized(),
            "down/" => return Err(AxisError::Transport("connection refused".into())),
            "slow/" => {
                return Err(AxisError::Timeout {
                    timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap(),
                });
            }
            "rotate/" => {
                let store = self.rotate_into.lock().unwrap().take();
                if let Some(store) = store {
                    store.save(&AccessToken::new("T2")).await?;
                    *self.accepted.lock().unwrap() = "T2".to_string();
                    unauthorized()
                } else if self.authorized(&call) {
                    Self::json(StatusCode::OK, &serde_json::json!({ "path": path }))
                } else {
                    unauthorized()
                }
            }
            _ if self.authorized(&call) => {
                Self::json(StatusCode::OK, &serde_json::json!({ "path": path }))
            }
            _ => unauthorized(),
        })
    }
}
