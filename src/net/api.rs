//! REST client for the external users/auth backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` only sees the `UsersApi` trait, so tests swap in scripted
//! mocks while the binary uses `HttpApi` (reqwest).
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `ApiError`; status classification and error-body
//! parsing live in `net::error` so they stay pure and testable.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{LoginRequest, LoginResponse, NewUser, User, UserId, UserUpdate};
use crate::config::HttpTimeouts;

const LOGIN_PATH: &str = "/api/auth/login";
const USERS_PATH: &str = "/api/users";

/// Backend operations the session store depends on.
#[async_trait::async_trait]
pub trait UsersApi: Send + Sync {
    /// Exchange credentials for a bearer token via `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// Any non-2xx response is reported as [`ApiError::Auth`].
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// `GET /api/users`.
    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError>;

    /// `GET /api/users/{id}`.
    async fn get_user(&self, token: &str, id: &UserId) -> Result<User, ApiError>;

    /// `POST /api/users`, returning the created record.
    async fn create_user(&self, token: &str, user: &NewUser) -> Result<User, ApiError>;

    /// `PUT /api/users/{id}`. Returns the updated record when the backend
    /// echoes one.
    async fn update_user(&self, token: &str, id: &UserId, update: &UserUpdate) -> Result<Option<User>, ApiError>;

    /// `DELETE /api/users/{id}`.
    async fn delete_user(&self, token: &str, id: &UserId) -> Result<(), ApiError>;
}

fn login_endpoint(base_url: &str) -> String {
    format!("{base_url}{LOGIN_PATH}")
}

fn users_endpoint(base_url: &str) -> String {
    format!("{base_url}{USERS_PATH}")
}

fn user_endpoint(base_url: &str, id: &UserId) -> String {
    format!("{base_url}{USERS_PATH}/{id}")
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn parse_optional_body<T: DeserializeOwned>(text: &str) -> Result<Option<T>, ApiError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_body(text).map(Some)
}

// =============================================================================
// CLIENT
// =============================================================================

/// reqwest-backed [`UsersApi`].
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client for `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| ApiError::Network(format!("HTTP client build failed: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the body text, mapping non-2xx to an error.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            tracing::debug!(status, "backend rejected request");
            return Err(ApiError::from_status(status, &text));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl UsersApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self.http.post(login_endpoint(&self.base_url)).json(&LoginRequest { email, password });
        let text = self.send(request).await.map_err(|error| match error {
            ApiError::Validation { message, .. } => ApiError::Auth(message),
            other => other,
        })?;
        parse_body(&text)
    }

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        let request = self.http.get(users_endpoint(&self.base_url)).bearer_auth(token);
        let text = self.send(request).await?;
        parse_body(&text)
    }

    async fn get_user(&self, token: &str, id: &UserId) -> Result<User, ApiError> {
        let request = self.http.get(user_endpoint(&self.base_url, id)).bearer_auth(token);
        let text = self.send(request).await?;
        parse_body(&text)
    }

    async fn create_user(&self, token: &str, user: &NewUser) -> Result<User, ApiError> {
        let request = self.http.post(users_endpoint(&self.base_url)).bearer_auth(token).json(user);
        let text = self.send(request).await?;
        parse_body(&text)
    }

    async fn update_user(&self, token: &str, id: &UserId, update: &UserUpdate) -> Result<Option<User>, ApiError> {
        let request = self.http.put(user_endpoint(&self.base_url, id)).bearer_auth(token).json(update);
        let text = self.send(request).await?;
        parse_optional_body(&text)
    }

    async fn delete_user(&self, token: &str, id: &UserId) -> Result<(), ApiError> {
        let request = self.http.delete(user_endpoint(&self.base_url, id)).bearer_auth(token);
        self.send(request).await?;
        Ok(())
    }
}
