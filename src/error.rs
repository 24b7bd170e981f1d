//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("collection name must not be empty")]
    EmptyName,
    #[error("{entity}: field '{field}' is assigned by the server and cannot be declared")]
    ReservedField { entity: String, field: String },
    #[error("{entity}: duplicate field '{field}'")]
    DuplicateField { entity: String, field: String },
    #[error("{entity}: excluded field '{field}' is not declared")]
    UnknownExclusion { entity: String, field: String },
    #[error("duplicate collection path: {0}")]
    DuplicatePath(String),
    #[error("{entity}: foreign key '{field}' references unknown table '{table}'")]
    UnknownForeignKey {
        entity: String,
        field: String,
        table: String,
    },
    #[error("foreign key cycle between tables: {0}")]
    ForeignKeyCycle(String),
    #[error("settings: {0}")]
    Settings(String),
    #[error("openapi document: {0}")]
    OpenApi(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{entity}:{id} not found")]
    NotFound { entity: String, id: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }
}

/// Error payload returned to clients: `{"detail": "..."}`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error while serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal database error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
