//! Failsafe: declarative collection CRUD over a persistence gateway.
//!
//! A collection type declares its fields once; the library derives its input and output
//! schemas, serves list/get/create/replace/patch/soft-delete routes for it under a URL prefix,
//! documents them in OpenAPI, and stores records through a [`gateway::Gateway`].

pub mod case;
pub mod collection;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use collection::Collection;
pub use config::{EntityDescriptor, FieldDef, FieldType, Settings};
pub use error::{AppError, ConfigError};
pub use gateway::{Gateway, MemoryGateway, PgGateway, Session};
pub use migration::ensure_tables;
pub use models::builtin_routers;
pub use routes::{app, CollectionsRouter};
pub use schema::{Record, Schema, SchemaMode};
pub use service::{is_visible, CrudService};
pub use state::AppState;
pub use store::ensure_database_exists;
