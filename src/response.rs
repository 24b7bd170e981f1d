//! Success response helpers. Records are returned bare; errors go through `AppError`.

use crate::schema::Record;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq)]
pub struct MessageBody {
    pub message: String,
}

pub fn ok_one(record: Record) -> (StatusCode, Json<Record>) {
    (StatusCode::OK, Json(record))
}

pub fn created(record: Record) -> (StatusCode, Json<Record>) {
    (StatusCode::CREATED, Json(record))
}

pub fn ok_many(records: Vec<Record>) -> (StatusCode, Json<Vec<Record>>) {
    (StatusCode::OK, Json(records))
}

/// 204 with a confirmation message. HTTP forbids a 204 body, so hyper drops it on the wire.
pub fn soft_deleted(entity: &str) -> (StatusCode, Json<MessageBody>) {
    (
        StatusCode::NO_CONTENT,
        Json(MessageBody {
            message: format!("{} soft deleted", entity),
        }),
    )
}
