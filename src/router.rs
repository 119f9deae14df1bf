//! Route table and the navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation resolves a path to its chain of matched route records and
//! then asks `guard` whether to proceed. The guard reads only the session's
//! access flags; it never mutates state and never awaits.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::collections::BTreeMap;
use std::fmt;

use crate::state::session::AccessFlags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteName {
    Login,
    Home,
    CreateUser,
    Users,
    UserDetail,
    NotAuthorized,
}

impl RouteName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Home => "home",
            Self::CreateUser => "create-user",
            Self::Users => "users",
            Self::UserDetail => "user-detail",
            Self::NotAuthorized => "not-authorized",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record access requirements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl RouteMeta {
    pub const PUBLIC: Self = Self { requires_auth: false, requires_admin: false };
    pub const AUTH: Self = Self { requires_auth: true, requires_admin: false };
    pub const ADMIN: Self = Self { requires_auth: true, requires_admin: true };
}

/// One entry in the route table. Child paths are relative to the parent.
#[derive(Clone, Debug)]
pub struct RouteRecord {
    pub name: RouteName,
    pub path: &'static str,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(name: RouteName, path: &'static str, meta: RouteMeta) -> Self {
        Self { name, path, meta, children: Vec::new() }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// A path resolved against the table: the leaf route plus the metadata of
/// every record on the way down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub name: RouteName,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub matched: Vec<RouteMeta>,
}

impl ResolvedRoute {
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|meta| meta.requires_auth)
    }

    #[must_use]
    pub fn requires_admin(&self) -> bool {
        self.matched.iter().any(|meta| meta.requires_admin)
    }
}

/// Outcome of a guard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(RouteName),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("no route matches {0}")]
    NotFound(String),
}

/// Decide whether navigation to `to` may proceed.
///
/// Unauthenticated access to an auth route always goes to login, even when
/// the route is also admin-only.
#[must_use]
pub fn guard(to: &ResolvedRoute, access: AccessFlags) -> Navigation {
    if to.requires_auth() && !access.is_authenticated {
        Navigation::Redirect(RouteName::Login)
    } else if to.requires_admin() && !access.is_admin {
        Navigation::Redirect(RouteName::NotAuthorized)
    } else if to.name == RouteName::Login && access.is_authenticated {
        Navigation::Redirect(RouteName::Home)
    } else {
        Navigation::Allow
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub struct Router {
    routes: Vec<RouteRecord>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(vec![
            RouteRecord::new(RouteName::Login, "/login", RouteMeta::PUBLIC),
            RouteRecord::new(RouteName::Home, "/", RouteMeta::AUTH),
            RouteRecord::new(RouteName::CreateUser, "/create-user", RouteMeta::ADMIN),
            RouteRecord::new(RouteName::Users, "/users", RouteMeta::ADMIN)
                .with_children(vec![RouteRecord::new(RouteName::UserDetail, ":id", RouteMeta::PUBLIC)]),
            RouteRecord::new(RouteName::NotAuthorized, "/not-authorized", RouteMeta::PUBLIC),
        ])
    }
}

impl Router {
    #[must_use]
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        Self { routes }
    }

    /// Match `path` (query string and fragment ignored) against the table.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] when nothing matches.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute, RouteError> {
        let clean = path.split(['?', '#']).next().unwrap_or_default();
        let input = segments(clean);

        for record in &self.routes {
            let mut chain = Vec::new();
            let mut params = BTreeMap::new();
            if match_record(record, &input, &mut params, &mut chain) {
                let leaf = chain.last().map_or(record.name, |r| r.name);
                return Ok(ResolvedRoute {
                    name: leaf,
                    path: format!("/{}", input.join("/")),
                    params,
                    matched: chain.iter().map(|r| r.meta).collect(),
                });
            }
        }
        Err(RouteError::NotFound(path.to_owned()))
    }

    /// Resolve `path` and run the guard.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] for unknown paths.
    pub fn navigate(&self, path: &str, access: AccessFlags) -> Result<Navigation, RouteError> {
        let to = self.resolve(path)?;
        let decision = guard(&to, access);
        tracing::debug!(
            to = %to.path,
            route = %to.name,
            is_authenticated = access.is_authenticated,
            is_admin = access.is_admin,
            ?decision,
            "route guard"
        );
        Ok(decision)
    }

    /// Absolute path of a top-level or nested route without params.
    #[must_use]
    pub fn path_for(&self, name: RouteName) -> Option<String> {
        fn walk(records: &[RouteRecord], prefix: &str, name: RouteName) -> Option<String> {
            for record in records {
                let joined = join_path(prefix, record.path);
                if record.name == name {
                    return Some(joined);
                }
                if let Some(found) = walk(&record.children, &joined, name) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.routes, "", name)
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let mut parts = segments(prefix);
    parts.extend(segments(path));
    format!("/{}", parts.join("/"))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Depth-first match. On success `chain` holds root-to-leaf records.
fn match_record<'r>(
    record: &'r RouteRecord,
    input: &[&str],
    params: &mut BTreeMap<String, String>,
    chain: &mut Vec<&'r RouteRecord>,
) -> bool {
    let own = segments(record.path);
    if own.len() > input.len() {
        return false;
    }

    let mut captured = Vec::new();
    for (pattern, actual) in own.iter().zip(input) {
        if let Some(param) = pattern.strip_prefix(':') {
            captured.push((param.to_owned(), (*actual).to_owned()));
        } else if pattern != actual {
            return false;
        }
    }

    let rest = &input[own.len()..];
    chain.push(record);
    if rest.is_empty() || record.children.iter().any(|child| match_record(child, rest, params, chain)) {
        params.extend(captured);
        return true;
    }
    chain.pop();
    false
}
