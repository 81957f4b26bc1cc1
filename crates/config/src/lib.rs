//! Configuration loading for the axis client.
//!
//! Uses figment for YAML-based configuration with sensible defaults,
//! overridable through `AXIS_*` environment variables.

pub mod schema;

pub use schema::{Config, LogConfig};
