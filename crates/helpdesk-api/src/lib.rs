//! Helpdesk API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Exposes login, the guided chat, the knowledge base (read for users,
//! read/write for admins), issue administration, and an event stream of
//! submissions and knowledge-base edits.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
