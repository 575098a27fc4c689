//! Application state for the API server

use crate::config::Config;
use crate::db::Database;
use crate::registry::JobStore;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clones) and
/// provides access to the job registry, the database pool, and the
/// configuration.
#[derive(Clone)]
pub struct AppState {
    /// Owner of all export job records
    pub registry: Arc<dyn JobStore>,

    /// Database handle the pipelines draw connections from
    pub database: Arc<Database>,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(registry: Arc<dyn JobStore>, database: Arc<Database>, config: Arc<Config>) -> Self {
        Self {
            registry,
            database,
            config,
        }
    }
}
