//! Copperlast auth server.
//!
//! Authentication and authorization core for the Copperlast storefront and
//! back office: customer and staff identity, bearer tokens, single-use
//! email tokens, and role-guarded routes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

/// Assemble the full application from state and a session layer.
///
/// Generic over the session store so tests can use an in-memory store while
/// production uses the database-backed one.
pub fn app<S: SessionStore + Clone>(
    state: AppState,
    session_layer: SessionManagerLayer<S>,
) -> Router {
    routes::router()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(NormalizePathLayer::trim_trailing_slash())
        .with_state(state)
}
