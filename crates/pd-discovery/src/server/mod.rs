//! HTTP front-end.
//!
//! This module contains:
//! - `state`: Shared application state
//! - `health`: Liveness probe
//! - `new`: The discovery endpoint replicas call at startup

mod health;
mod new;
mod state;

pub use state::AppState;

use axum::{routing::get, Router};

use crate::refresh::ClusterRefresher;

/// Create the API router with all endpoints
pub fn create_router<R: ClusterRefresher + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Wildcard: standard base64 may contain '/' characters.
        .route("/new/{*advertise_peer_url}", get(new::new_peer::<R>))
        .with_state(state)
}
