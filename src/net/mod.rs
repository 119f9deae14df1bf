//! Users/auth backend boundary: wire DTOs, error taxonomy, HTTP client.

pub mod api;
pub mod error;
pub mod types;
