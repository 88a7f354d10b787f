// Application state module
// Shared by every connection task

use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::storage::DocumentStore;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Backing store for static files and JSON documents
    pub store: Arc<dyn DocumentStore>,
    /// Signalled once to stop accepting connections
    pub shutdown: Arc<Notify>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            store,
            shutdown: Arc::new(Notify::new()),
        }
    }
}
