//! Kanban task-board client: session/auth state, route guarding, board data.
//!
//! SYSTEM CONTEXT
//! ==============
//! The UI (or the bundled CLI) owns one `SessionStore` and one `BoardStore`.
//! Before every navigation the router consults the session's access flags;
//! session actions talk to the external users/auth REST API through the
//! `UsersApi` seam.

pub mod config;
pub mod net;
pub mod router;
pub mod state;
pub mod util;

pub use config::ClientConfig;
pub use net::api::{HttpApi, UsersApi};
pub use net::error::ApiError;
pub use router::{Navigation, RouteName, Router};
pub use state::board::BoardStore;
pub use state::session::{AccessFlags, SessionStore};
