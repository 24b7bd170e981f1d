//! Generic collection operations over a persistence session.
//!
//! Payloads arrive already validated against the input schema; every result is shaped by the
//! output schema. Soft-deleted records are invisible to every path except soft-delete itself.

use crate::config::{timestamp_now, EntityDescriptor, CREATED_AT_FIELD, DELETED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use crate::error::AppError;
use crate::gateway::{Filter, Session};
use crate::schema::Record;
use serde_json::Value;

/// Whether a stored record is visible to clients.
pub fn is_visible(record: &Record) -> bool {
    record.get(DELETED_AT_FIELD).map(Value::is_null).unwrap_or(true)
}

pub struct CrudService;

impl CrudService {
    /// Active records matching every equality filter.
    pub async fn list(
        session: &mut dyn Session,
        entity: &EntityDescriptor,
        filters: Vec<(String, Value)>,
    ) -> Result<Vec<Record>, AppError> {
        let mut predicates: Vec<Filter> = filters.into_iter().map(|(col, val)| Filter::Eq(col, val)).collect();
        predicates.push(Filter::IsNull(DELETED_AT_FIELD.into()));
        let rows = session.query(entity, &predicates).await?;
        let output = entity.output_schema();
        Ok(rows.iter().filter(|r| is_visible(r)).map(|r| output.project(r)).collect())
    }

    /// One active record by id.
    pub async fn read(session: &mut dyn Session, entity: &EntityDescriptor, id: i64) -> Result<Record, AppError> {
        let row = Self::find_visible(session, entity, id).await?;
        Ok(entity.output_schema().project(&row))
    }

    /// Insert a new record from validated input. The store assigns `id`.
    pub async fn create(session: &mut dyn Session, entity: &EntityDescriptor, input: Record) -> Result<Record, AppError> {
        let mut record = Self::new_record(entity, input);
        session.add(entity, &mut record).await?;
        session.commit().await?;
        session.refresh(entity, &mut record).await?;
        Ok(entity.output_schema().project(&record))
    }

    /// Overwrite an active record with every non-null field of `changes` and bump `updated_at`.
    /// Replace passes a full payload (defaults applied), partial update only the supplied fields.
    pub async fn update(
        session: &mut dyn Session,
        entity: &EntityDescriptor,
        id: i64,
        changes: Record,
    ) -> Result<Record, AppError> {
        let mut record = Self::find_visible(session, entity, id).await?;
        for (field, value) in changes {
            if value.is_null() || !entity.input_schema().contains(&field) {
                continue;
            }
            record.insert(field, value);
        }
        record.insert(UPDATED_AT_FIELD.into(), Value::String(timestamp_now()));
        session.add(entity, &mut record).await?;
        session.commit().await?;
        session.refresh(entity, &mut record).await?;
        Ok(entity.output_schema().project(&record))
    }

    /// Stamp `deleted_at`. Records already soft-deleted are stamped again.
    pub async fn soft_delete(session: &mut dyn Session, entity: &EntityDescriptor, id: i64) -> Result<(), AppError> {
        let mut record = session
            .get(entity, id)
            .await?
            .ok_or_else(|| AppError::not_found(entity.name(), id))?;
        record.insert(DELETED_AT_FIELD.into(), Value::String(timestamp_now()));
        session.add(entity, &mut record).await?;
        session.commit().await?;
        Ok(())
    }

    async fn find_visible(session: &mut dyn Session, entity: &EntityDescriptor, id: i64) -> Result<Record, AppError> {
        session
            .get(entity, id)
            .await?
            .filter(is_visible)
            .ok_or_else(|| AppError::not_found(entity.name(), id))
    }

    /// Input fields plus base fields: no id yet, created now, `updated_at` from its default, active.
    fn new_record(entity: &EntityDescriptor, input: Record) -> Record {
        let mut record = Record::new();
        record.insert(ID_FIELD.into(), Value::Null);
        record.insert(CREATED_AT_FIELD.into(), Value::String(timestamp_now()));
        record.insert(
            UPDATED_AT_FIELD.into(),
            entity
                .field(UPDATED_AT_FIELD)
                .and_then(|f| f.default.as_ref())
                .map(|d| d.resolve())
                .unwrap_or(Value::Null),
        );
        record.insert(DELETED_AT_FIELD.into(), Value::Null);
        let input_schema = entity.input_schema();
        for (field, value) in input {
            if input_schema.contains(&field) {
                record.insert(field, value);
            }
        }
        record
    }
}
