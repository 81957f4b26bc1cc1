//! Token endpoint payloads.
//!
//! Login posts credentials and receives an access token; refresh posts no
//! body (the rotation secret rides in a cookie) and receives a new one.

use axis_types::{AccessToken, ApiResponse, AxisError, traits::Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

/// Login credentials for the token endpoint. The password is only exposed
/// when the login body is serialized.
pub struct Credentials {
    pub email: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self::new(self.email.clone(), self.password.expose_secret())
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Credentials", 2)?;
        body.serialize_field("email", &self.email)?;
        body.serialize_field("password", self.password.expose_secret())?;
        body.end()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(alias = "access_token")]
    access: String,
}

/// Extract the access token from a token endpoint response.
///
/// # Errors
///
/// Returns [`AxisError::Unauthorized`] for 401/403, [`AxisError::Domain`] for
/// any other non-2xx status, and [`AxisError::Serialization`] when the body
/// lacks an `access` (or `access_token`) string.
pub fn parse_token_response(resp: &ApiResponse) -> Result<AccessToken> {
    let status = resp.status.as_u16();
    if matches!(status, 401 | 403) {
        return Err(AxisError::Unauthorized {
            status,
            body: resp.text(),
        });
    }
    if !resp.is_success() {
        return Err(AxisError::Domain {
            status,
            body: resp.text(),
            headers: Box::new(resp.headers.clone()),
        });
    }
    let parsed: TokenResponse = resp.json()?;
    if parsed.access.is_empty() {
        return Err(AxisError::Unauthorized {
            status,
            body: "empty access token".into(),
        });
    }
    Ok(AccessToken::new(parsed.access))
}
