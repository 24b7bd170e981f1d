//! Request validation against derived schemas: payload bodies, list filters, path ids.

use crate::error::AppError;
use crate::schema::{Record, Schema, SchemaMode};
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Check a JSON body against the input schema and return the accepted fields.
    /// Unknown keys are dropped. All problems are reported together, separated by "; ".
    pub fn validate(schema: &Schema, body: &Value, mode: SchemaMode) -> Result<Record, AppError> {
        let obj = body
            .as_object()
            .ok_or_else(|| AppError::Validation("body must be a JSON object".into()))?;
        let mut out = Record::new();
        let mut errors = Vec::new();
        for field in schema.fields() {
            match obj.get(&field.name) {
                Some(Value::Null) => {
                    if field.nullable {
                        out.insert(field.name.clone(), Value::Null);
                    } else {
                        errors.push(format!("{}: may not be null", field.name));
                    }
                }
                Some(v) => match field.ty.coerce(v) {
                    Some(coerced) => {
                        out.insert(field.name.clone(), coerced);
                    }
                    None => errors.push(format!("{}: expected {}", field.name, field.ty.label())),
                },
                None => {
                    if mode == SchemaMode::Partial {
                        continue;
                    }
                    match &field.default {
                        Some(default) => {
                            out.insert(field.name.clone(), default.resolve());
                        }
                        None => errors.push(format!("{}: field required", field.name)),
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(AppError::Validation(errors.join("; ")))
        }
    }

    /// Turn query parameters into equality filters on output-schema fields.
    /// Unknown parameters are ignored; values that do not parse as the field's type are rejected.
    pub fn filters(schema: &Schema, params: &HashMap<String, String>) -> Result<Vec<(String, Value)>, AppError> {
        let mut filters = Vec::new();
        for field in schema.fields() {
            let Some(raw) = params.get(&field.name) else { continue };
            let value = field.ty.parse_str(raw).ok_or_else(|| {
                AppError::Validation(format!("{}: expected {}", field.name, field.ty.label()))
            })?;
            filters.push((field.name.clone(), value));
        }
        Ok(filters)
    }

    pub fn parse_id(id_str: &str) -> Result<i64, AppError> {
        id_str
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("id: expected an integer, got '{}'", id_str)))
    }
}
