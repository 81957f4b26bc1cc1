//! Core types and traits for the axis workspace.
//!
//! This crate defines the shared abstractions used across every layer of the
//! authenticated API client: the error taxonomy, the access token wrapper,
//! request/response values, and the async traits for the collaborators the
//! client is built on (token store, tenant store, raw transport, logout signal).

pub mod error;
pub mod request;
pub mod token;
pub mod traits;

pub use error::AxisError;
pub use request::{ApiRequest, ApiResponse, OutboundRequest};
pub use token::AccessToken;
pub use traits::{LogoutHandler, TenantStore, TokenStore, Transport};
