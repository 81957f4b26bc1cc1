//! Session storage backends for the access token and tenant context.
//!
//! Provides in-memory stores for testing and embedding, and a SQLite-backed
//! store that persists the session between CLI invocations.

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryTenantStore, InMemoryTokenStore};
pub use sqlite::SqliteSessionStore;
