//! Shared state for the API handlers.

use std::sync::Arc;

use crate::engine::LifecycleEngine;

/// Shared application state.
///
/// Holds the engine, and through it the policy every request is evaluated under.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<LifecycleEngine>,
}

impl AppState {
    /// Creates a new application state around an engine.
    pub fn new(engine: LifecycleEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }
}
