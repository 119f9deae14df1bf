//! Display-only decoding of bearer-token claims.
//!
//! SYSTEM CONTEXT
//! ==============
//! The client never verifies signatures; the backend does that on every call.
//! Claims are read only to show who is logged in and to gate navigation.

#[cfg(test)]
#[path = "jwt_test.rs"]
mod jwt_test;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::de::Error as _;
use serde_json::Value;

use crate::net::types::{Role, UserId};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not base64url: {0}")]
    Base64(String),

    #[error("token payload is not a JSON claims object: {0}")]
    Claims(String),

    #[error("token has expired")]
    Expired,

    #[error("token lacks the `{0}` claim")]
    MissingClaim(&'static str),
}

/// Identity-relevant claims. Every field is optional; callers merge them with
/// whatever else they know about the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, alias = "userId", alias = "user_id")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_role_claim")]
    pub role: Option<Role>,
    /// Expiry, seconds since the Unix epoch. Fractions are truncated.
    #[serde(default, deserialize_with = "deserialize_numeric_date")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// `true` when an `exp` claim exists and is at or before `now_secs`.
    #[must_use]
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_secs)
    }

    /// The subject when it looks like an email address.
    #[must_use]
    pub fn subject_email(&self) -> Option<&str> {
        self.sub.as_deref().filter(|sub| sub.contains('@'))
    }
}

/// Decode the payload segment of a JWT without verifying the signature.
///
/// # Errors
///
/// Returns [`TokenError`] when the token is not three dot-separated segments
/// or the payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Base64(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Claims(e.to_string()))
}

/// Accepts `"admin"`, `"ADMIN"`, Spring-style `"ROLE_ADMIN"`, or an array of
/// those (first recognised entry wins). Anything else is treated as absent
/// rather than failing the whole token.
fn deserialize_role_claim<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(role_from_claim(&Value::deserialize(deserializer)?))
}

fn role_from_claim(value: &Value) -> Option<Role> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            let name = trimmed
                .strip_prefix("ROLE_")
                .or_else(|| trimmed.strip_prefix("role_"))
                .unwrap_or(trimmed);
            Role::parse(name)
        }
        Value::Array(items) => items.iter().find_map(role_from_claim),
        _ => None,
    }
}

/// JWT NumericDate: integer or fractional seconds.
fn deserialize_numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(secs) = number.as_i64() {
        return Ok(Some(secs));
    }
    #[allow(clippy::cast_possible_truncation)]
    let secs = number.as_f64().map(|f| f.trunc() as i64);
    secs.map(Some).ok_or_else(|| D::Error::custom(format!("invalid exp claim: {number}")))
}
