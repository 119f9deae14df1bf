//! Error taxonomy for backend calls.
//!
//! ERROR HANDLING
//! ==============
//! Session actions decide policy per variant: `Auth` resets the session,
//! list fetches swallow everything, mutations propagate and leave the cache
//! untouched. Nothing here retries.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use super::types::ErrorBody;

/// Errors produced by users/auth API calls.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request did not complete (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Bad credentials, a rejected/expired token, or an undecodable token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response other than an auth rejection.
    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// A 2xx response whose body could not be parsed.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// A mutation was attempted without a session token.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    /// Classify a non-2xx response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(status, body);
        match status {
            401 | 403 => Self::Auth(message),
            _ => Self::Validation { status, message },
        }
    }

    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::NotAuthenticated)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Human-readable message for an error response: the structured body's
/// `message`/`error` field when present, otherwise the raw text.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }
    let raw = body.trim();
    if raw.is_empty() { format!("HTTP {status}") } else { raw.to_owned() }
}
