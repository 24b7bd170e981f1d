//! Persistence gateway: the unit-of-work contract the collection routes depend on.
//!
//! A [`Gateway`] hands out one [`Session`] per request. Writes made through a session become
//! visible to others only after [`Session::commit`]; a session dropped without commit is
//! rolled back.

mod memory;
mod postgres;

pub use memory::MemoryGateway;
pub use postgres::PgGateway;

use crate::config::EntityDescriptor;
use crate::error::AppError;
use crate::schema::Record;
use async_trait::async_trait;
use serde_json::Value;

/// Predicate for [`Session::query`]. Multiple filters are ANDed.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    IsNull(String),
}

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Eq(field, value) => record.get(field) == Some(value),
            Filter::IsNull(field) => record.get(field).map(Value::is_null).unwrap_or(true),
        }
    }
}

#[async_trait]
pub trait Session: Send {
    /// Row by primary key, soft-deleted rows included.
    async fn get(&mut self, entity: &EntityDescriptor, id: i64) -> Result<Option<Record>, AppError>;

    /// Rows matching every filter, ordered by id.
    async fn query(&mut self, entity: &EntityDescriptor, filters: &[Filter]) -> Result<Vec<Record>, AppError>;

    /// Stage a write: insert when `id` is null (the assigned id is written back), update otherwise.
    /// Updating a soft-deleted row with a null `deleted_at` fails with NotFound.
    async fn add(&mut self, entity: &EntityDescriptor, record: &mut Record) -> Result<(), AppError>;

    /// Make staged writes durable. Constraint violations surface as `AppError::Validation`.
    async fn commit(&mut self) -> Result<(), AppError>;

    /// Reload `record` from the store by its id.
    async fn refresh(&mut self, entity: &EntityDescriptor, record: &mut Record) -> Result<(), AppError>;
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Open a unit of work for one request.
    async fn session(&self) -> Result<Box<dyn Session>, AppError>;

    /// Cheap liveness check of the backing store.
    async fn ping(&self) -> Result<(), AppError>;
}

pub(crate) fn record_id(record: &Record) -> Option<i64> {
    record.get(crate::config::ID_FIELD).and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_match_records() {
        let mut r = Record::new();
        r.insert("name".into(), json!("High"));
        r.insert("deleted_at".into(), Value::Null);
        assert!(Filter::Eq("name".into(), json!("High")).matches(&r));
        assert!(!Filter::Eq("name".into(), json!("Low")).matches(&r));
        assert!(Filter::IsNull("deleted_at".into()).matches(&r));
        assert!(Filter::IsNull("missing".into()).matches(&r));
        r.insert("deleted_at".into(), json!("2024-01-01T00:00:00Z"));
        assert!(!Filter::IsNull("deleted_at".into()).matches(&r));
    }
}
