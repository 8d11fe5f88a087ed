//! Application State
//!
//! Shared state passed to all API handlers.

use std::sync::Arc;

use crate::discovery::Discovery;

/// Shared application state
pub struct AppState<R> {
    pub discovery: Arc<Discovery<R>>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            discovery: self.discovery.clone(),
        }
    }
}
