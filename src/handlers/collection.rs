//! Collection handlers: list, read, create, replace, partial update, soft delete.
//!
//! Every handler works on the descriptor carried in [`CollectionState`] and opens one gateway
//! session for the request; the session is committed by the service or dropped (rolled back).

use crate::error::AppError;
use crate::response::{created, ok_many, ok_one, soft_deleted};
use crate::schema::SchemaMode;
use crate::service::{CrudService, RequestValidator};
use crate::state::CollectionState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v).map_err(|e| AppError::Validation(e.body_text()))
}

pub async fn list(
    State(state): State<CollectionState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filters = RequestValidator::filters(&state.entity.output_schema(), &params)?;
    let mut session = state.gateway.session().await?;
    let rows = CrudService::list(session.as_mut(), &state.entity, filters).await?;
    Ok(ok_many(rows))
}

pub async fn read(
    State(state): State<CollectionState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::parse_id(&id_str)?;
    let mut session = state.gateway.session().await?;
    let row = CrudService::read(session.as_mut(), &state.entity, id).await?;
    Ok(ok_one(row))
}

pub async fn create(
    State(state): State<CollectionState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(body)?;
    let input = RequestValidator::validate(&state.entity.input_schema(), &body, SchemaMode::Full)?;
    let mut session = state.gateway.session().await?;
    let row = CrudService::create(session.as_mut(), &state.entity, input).await?;
    Ok(created(row))
}

/// PUT: full payload, omitted optional fields take their defaults.
pub async fn replace(
    State(state): State<CollectionState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::parse_id(&id_str)?;
    let body = json_body(body)?;
    let input = RequestValidator::validate(&state.entity.input_schema(), &body, SchemaMode::Full)?;
    let mut session = state.gateway.session().await?;
    let row = CrudService::update(session.as_mut(), &state.entity, id, input).await?;
    Ok(ok_one(row))
}

/// PATCH: only the supplied fields change.
pub async fn partial_update(
    State(state): State<CollectionState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::parse_id(&id_str)?;
    let body = json_body(body)?;
    let changes = RequestValidator::validate(&state.entity.input_schema(), &body, SchemaMode::Partial)?;
    let mut session = state.gateway.session().await?;
    let row = CrudService::update(session.as_mut(), &state.entity, id, changes).await?;
    Ok(ok_one(row))
}

pub async fn delete(
    State(state): State<CollectionState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::parse_id(&id_str)?;
    let mut session = state.gateway.session().await?;
    CrudService::soft_delete(session.as_mut(), &state.entity, id).await?;
    Ok(soft_deleted(state.entity.name()))
}
