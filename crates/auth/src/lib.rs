//! Authenticated API client for the axis workspace.
//!
//! [`AuthenticatedClient`] attaches the bearer token and tenant header to
//! every call and recovers from an expired access token with a single-flight
//! refresh coordinated by the [`RefreshGate`].

pub mod client;
pub mod gate;
pub mod settings;
pub mod token;

#[cfg(test)]
mod mock;

pub use client::AuthenticatedClient;
pub use gate::{PendingRequest, RefreshGate, RefreshState};
pub use settings::ClientSettings;
pub use token::{Credentials, parse_token_response};
