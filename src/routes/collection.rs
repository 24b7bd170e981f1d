//! Route generator: one router per URL prefix, one set of CRUD routes per registered collection.
//!
//! For a collection `Severity` under prefix `/reference` the router serves
//! `/reference/severities` and `/reference/severities/` (list, create) and
//! `/reference/severities/:id` (read, replace, partial update, soft delete).

use crate::collection::Collection;
use crate::config::{validate_collections, EntityDescriptor};
use crate::error::ConfigError;
use crate::gateway::Gateway;
use crate::handlers::collection::{create, delete, list, partial_update, read, replace};
use crate::state::CollectionState;
use axum::{routing::get, Router};
use std::collections::HashSet;
use std::sync::Arc;

pub struct CollectionsRouter {
    prefix: String,
    tags: Vec<String>,
    collections: Vec<Arc<EntityDescriptor>>,
}

impl CollectionsRouter {
    /// `prefix` is normalized to a leading slash and no trailing slash ("" serves at the root).
    pub fn new(prefix: &str, tags: &[&str]) -> Self {
        let trimmed = prefix.trim_matches('/');
        CollectionsRouter {
            prefix: if trimmed.is_empty() {
                String::new()
            } else {
                format!("/{}", trimmed)
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
            collections: Vec::new(),
        }
    }

    /// Register a collection type. Its descriptor and schemas are resolved here, once.
    pub fn add_collection<C: Collection>(self) -> Result<Self, ConfigError> {
        let descriptor = C::descriptor()?;
        self.add_descriptor(descriptor)
    }

    /// Register an already resolved descriptor. Two collections may not share a path.
    pub fn add_descriptor(mut self, descriptor: Arc<EntityDescriptor>) -> Result<Self, ConfigError> {
        let path = self.collection_path(&descriptor);
        if self.collections.iter().any(|c| self.collection_path(c) == path) {
            return Err(ConfigError::DuplicatePath(path));
        }
        self.collections.push(descriptor);
        Ok(self)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn collections(&self) -> &[Arc<EntityDescriptor>] {
        &self.collections
    }

    /// Collection root without trailing slash, e.g. "/projects/user-team-links".
    pub fn collection_path(&self, descriptor: &EntityDescriptor) -> String {
        format!("{}/{}", self.prefix, descriptor.path_segment())
    }

    /// Check paths and foreign keys; `known_tables` are tables served by other routers.
    pub fn validate(&self, known_tables: &HashSet<String>) -> Result<(), ConfigError> {
        validate_collections(&self.prefix, &self.collections, known_tables)
    }

    /// Build the axum router. Each collection's routes carry their own [`CollectionState`].
    pub fn routes(&self, gateway: Arc<dyn Gateway>) -> Router {
        let mut router = Router::new();
        for entity in &self.collections {
            let base = self.collection_path(entity);
            let state = CollectionState {
                gateway: gateway.clone(),
                entity: entity.clone(),
            };
            let collection = Router::new()
                .route(&base, get(list).post(create))
                .route(&format!("{}/", base), get(list).post(create))
                .route(
                    &format!("{}/:id", base),
                    get(read).put(replace).patch(partial_update).delete(delete),
                )
                .with_state(state);
            router = router.merge(collection);
        }
        router
    }
}
