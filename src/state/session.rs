//! Auth-session state for the current user plus the cached user list.
//!
//! SYSTEM CONTEXT
//! ==============
//! The router reads `access()` synchronously before every navigation. Login,
//! logout and user management are discrete user actions that mutate this
//! store; the UI is expected to disable re-entrant triggers.
//!
//! INVARIANTS
//! ==========
//! A token is held if and only if a decoded identity is held: both live in a
//! single `Option<Session>`. A failed login or an undecodable stored token
//! leaves no partial state in memory or in durable storage.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::net::api::UsersApi;
use crate::net::error::ApiError;
use crate::net::types::{LoginResponse, NewUser, Role, SessionUser, User, UserId, UserUpdate};
use crate::util::jwt::{self, TokenClaims, TokenError};
use crate::util::storage::{self, KeyValueStorage};

/// Durable storage key for the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Durable storage key for the JSON identity. Superseded by the token claims
/// but still written so older readers keep working.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Flags the route guard decides on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessFlags {
    pub is_authenticated: bool,
    pub is_admin: bool,
}

/// An authenticated session: the bearer token and the identity decoded from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

/// Identity fields known from somewhere other than the token claims (the
/// login response body, or the stored `currentUser`).
#[derive(Clone, Debug, Default)]
struct IdentityHints {
    id: Option<UserId>,
    name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
}

impl From<&LoginResponse> for IdentityHints {
    fn from(resp: &LoginResponse) -> Self {
        Self { id: resp.id.clone(), name: resp.name.clone(), email: resp.email.clone(), role: resp.role }
    }
}

impl From<SessionUser> for IdentityHints {
    fn from(user: SessionUser) -> Self {
        Self { id: Some(user.id), name: Some(user.name), email: Some(user.email), role: Some(user.role) }
    }
}

/// Merge token claims with fallback hints. Claims win.
fn resolve_identity(claims: TokenClaims, hints: IdentityHints) -> Result<SessionUser, TokenError> {
    let subject_email = claims.subject_email().map(ToOwned::to_owned);
    let subject_id = claims.sub.filter(|sub| !sub.contains('@') && !sub.trim().is_empty()).map(UserId::new);

    let id = claims.id.or(hints.id).or(subject_id).ok_or(TokenError::MissingClaim("id"))?;
    let email = claims.email.or(hints.email).or(subject_email).ok_or(TokenError::MissingClaim("email"))?;
    let name = claims.name.or(hints.name).unwrap_or_else(|| email.clone());
    let role = claims.role.or(hints.role).ok_or(TokenError::MissingClaim("role"))?;

    Ok(SessionUser { id, name, email, role })
}

/// Decode `token` into an identity, rejecting expired tokens.
fn identity_from_token(token: &str, hints: IdentityHints, now_secs: i64) -> Result<SessionUser, TokenError> {
    let claims = jwt::decode_claims(token)?;
    if claims.is_expired(now_secs) {
        return Err(TokenError::Expired);
    }
    resolve_identity(claims, hints)
}

fn now_secs() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

// =============================================================================
// STORE
// =============================================================================

/// Session and user-management store.
pub struct SessionStore {
    api: Arc<dyn UsersApi>,
    storage: Box<dyn KeyValueStorage>,
    session: Option<Session>,
    users: Vec<User>,
}

impl SessionStore {
    /// Create the store and hydrate it once from durable storage.
    pub fn new(api: Arc<dyn UsersApi>, storage: Box<dyn KeyValueStorage>) -> Self {
        let mut store = Self { api, storage, session: None, users: Vec::new() };
        store.hydrate(now_secs());
        store
    }

    fn hydrate(&mut self, now_secs: i64) {
        let Some(token) = self.storage.get_item(TOKEN_KEY) else {
            if self.storage.get_item(CURRENT_USER_KEY).is_some() {
                tracing::debug!("discarding stored identity without a token");
                self.storage.remove_item(CURRENT_USER_KEY);
            }
            return;
        };

        let hints = storage::load_json::<SessionUser>(self.storage.as_ref(), CURRENT_USER_KEY)
            .map(IdentityHints::from)
            .unwrap_or_default();
        match identity_from_token(&token, hints, now_secs) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "session restored");
                storage::save_json(self.storage.as_mut(), CURRENT_USER_KEY, &user);
                self.session = Some(Session { token, user });
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding stored session");
                self.clear_durable();
            }
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&SessionUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// Cached user list. Empty or stale means "unknown", not "no users".
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    #[must_use]
    pub fn storage(&self) -> &dyn KeyValueStorage {
        self.storage.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|user| user.role == Role::Admin)
    }

    #[must_use]
    pub fn access(&self) -> AccessFlags {
        AccessFlags { is_authenticated: self.is_authenticated(), is_admin: self.is_admin() }
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.token().map(ToOwned::to_owned).ok_or(ApiError::NotAuthenticated)
    }

    // =========================================================================
    // AUTH ACTIONS
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Network failures, backend rejections and undecodable tokens are all
    /// returned after the session has been reset to a clean unauthenticated
    /// state.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        let api = Arc::clone(&self.api);
        let outcome = match api.login(email, password).await {
            Ok(resp) => identity_from_token(&resp.token, IdentityHints::from(&resp), now_secs())
                .map(|user| (resp.token, user))
                .map_err(|e| ApiError::Auth(format!("invalid token: {e}"))),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((token, user)) => {
                self.storage.set_item(TOKEN_KEY, &token);
                storage::save_json(self.storage.as_mut(), CURRENT_USER_KEY, &user);
                tracing::info!(user_id = %user.id, role = %user.role, "logged in");
                let same_user = self.session.as_ref().is_some_and(|prev| prev.user.id == user.id);
                if !same_user {
                    self.users.clear();
                }
                self.session = Some(Session { token, user: user.clone() });
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.session = None;
                self.users.clear();
                self.clear_durable();
                Err(e)
            }
        }
    }

    /// Clear the session in memory and in durable storage.
    ///
    /// The logged-out user's row is also dropped from the cached user list so
    /// a user-management view never shows a stale self entry.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            self.users.retain(|user| user.id != session.user.id);
            tracing::info!(user_id = %session.user.id, "logged out");
        }
        self.clear_durable();
    }

    fn clear_durable(&mut self) {
        self.storage.remove_item(TOKEN_KEY);
        self.storage.remove_item(CURRENT_USER_KEY);
    }

    // =========================================================================
    // USER MANAGEMENT
    // =========================================================================

    /// Replace the cached user list with the backend's. No-op without a
    /// session; failures are logged and leave the cache unchanged.
    pub async fn fetch_users(&mut self) {
        let Some(token) = self.token().map(ToOwned::to_owned) else {
            tracing::debug!("skipping user fetch: not authenticated");
            return;
        };
        let api = Arc::clone(&self.api);
        match api.list_users(&token).await {
            Ok(users) => {
                tracing::debug!(count = users.len(), "user list refreshed");
                self.users = users;
            }
            Err(e) => tracing::warn!(error = %e, "failed to fetch users"),
        }
    }

    /// Fetch one user and refresh its cached row if present.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] without a session, otherwise
    /// whatever the backend call returns.
    pub async fn fetch_user(&mut self, id: &UserId) -> Result<User, ApiError> {
        let token = self.bearer()?;
        let user = Arc::clone(&self.api).get_user(&token, id).await?;
        if let Some(cached) = self.users.iter_mut().find(|cached| cached.id == user.id) {
            cached.clone_from(&user);
        }
        Ok(user)
    }

    /// Create a user and append the returned record to the cache.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; the cache is untouched on error.
    pub async fn create_user(&mut self, new_user: &NewUser) -> Result<User, ApiError> {
        let token = self.bearer()?;
        let created = Arc::clone(&self.api).create_user(&token, new_user).await?;
        tracing::info!(user_id = %created.id, "user created");
        self.users.push(created.clone());
        Ok(created)
    }

    /// Update a user, then refetch the whole list.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; the cache is untouched on error.
    pub async fn update_user(&mut self, id: &UserId, update: &UserUpdate) -> Result<Option<User>, ApiError> {
        let token = self.bearer()?;
        let updated = Arc::clone(&self.api).update_user(&token, id, update).await?;
        tracing::info!(user_id = %id, "user updated");
        self.fetch_users().await;
        Ok(updated)
    }

    /// Delete a user; the cached row is removed only after a 2xx.
    ///
    /// # Errors
    ///
    /// Propagates backend failures with the parsed error message.
    pub async fn delete_user(&mut self, id: &UserId) -> Result<(), ApiError> {
        let token = self.bearer()?;
        Arc::clone(&self.api).delete_user(&token, id).await?;
        if let Some(index) = self.users.iter().position(|user| &user.id == id) {
            self.users.remove(index);
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
