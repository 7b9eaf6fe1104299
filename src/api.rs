//! HTTP API for the carpool service

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::{DatabaseStorage, RuntimeManager};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager<DatabaseStorage>>,
}

impl AppState {
    pub fn new(runtime: RuntimeManager<DatabaseStorage>) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }
}
