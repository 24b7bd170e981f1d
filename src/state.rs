//! Shared state handed to routes through axum's `State` extractor.

use crate::config::EntityDescriptor;
use crate::gateway::Gateway;
use std::sync::Arc;

/// App-wide state: the persistence gateway every request opens its session on.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        AppState { gateway }
    }
}

/// State of one collection's routes: the gateway plus the descriptor the routes were built from.
#[derive(Clone)]
pub struct CollectionState {
    pub gateway: Arc<dyn Gateway>,
    pub entity: Arc<EntityDescriptor>,
}
