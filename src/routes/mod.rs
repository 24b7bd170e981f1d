//! Router composition: collection routers, common routes, OpenAPI document, body limit.

pub mod collection;
pub mod common;

pub use collection::CollectionsRouter;
pub use common::{common_routes, openapi_routes};

use crate::error::ConfigError;
use crate::gateway::Gateway;
use crate::state::AppState;
use axum::Router;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Validate `routers` together (paths, foreign keys across routers) and build the full app.
pub fn app(gateway: Arc<dyn Gateway>, routers: &[CollectionsRouter], body_limit: usize) -> Result<Router, ConfigError> {
    let tables: HashSet<String> = routers
        .iter()
        .flat_map(|r| r.collections())
        .map(|c| c.table_name().to_string())
        .collect();
    let mut paths = HashSet::new();
    for router in routers {
        router.validate(&tables)?;
        for c in router.collections() {
            let path = router.collection_path(c);
            if !paths.insert(path.clone()) {
                return Err(ConfigError::DuplicatePath(path));
            }
        }
    }

    let document = serde_json::to_value(crate::openapi::document(routers))
        .map_err(|e| ConfigError::OpenApi(e.to_string()))?;

    let mut app = common_routes(AppState::new(gateway.clone())).merge(openapi_routes(Arc::new(document)));
    for router in routers {
        tracing::info!(
            prefix = %router.prefix(),
            collections = ?router.collections().iter().map(|c| c.name()).collect::<Vec<_>>(),
            "registering collections"
        );
        app = app.merge(router.routes(gateway.clone()));
    }
    Ok(app.layer(RequestBodyLimitLayer::new(body_limit)))
}
