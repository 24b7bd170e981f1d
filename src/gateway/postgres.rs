//! PostgreSQL gateway on a shared sqlx pool. Each session lazily opens one transaction on its
//! first write; reads before that go straight to the pool.

use super::{record_id, Filter, Gateway, Session};
use crate::config::{format_timestamp, EntityDescriptor, FieldType, ID_FIELD};
use crate::error::AppError;
use crate::schema::Record;
use crate::sql::{insert, select_by_id, select_list, update, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
    schema: String,
}

impl PgGateway {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgGateway {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn session(&self) -> Result<Box<dyn Session>, AppError> {
        Ok(Box::new(PgSession {
            pool: self.pool.clone(),
            schema: self.schema.clone(),
            tx: None,
        }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

pub struct PgSession {
    pool: PgPool,
    schema: String,
    /// Open while writes are pending; dropping it rolls them back.
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    async fn fetch_optional(&mut self, entity: &EntityDescriptor, q: &QueryBuf) -> Result<Option<Record>, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = match self.tx.as_mut() {
            Some(tx) => query.fetch_optional(&mut **tx).await?,
            None => query.fetch_optional(&self.pool).await?,
        };
        row.map(|r| row_to_record(entity, &r)).transpose()
    }

    async fn fetch_all(&mut self, entity: &EntityDescriptor, q: &QueryBuf) -> Result<Vec<Record>, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = match self.tx.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        rows.iter().map(|r| row_to_record(entity, r)).collect()
    }
}

#[async_trait]
impl Session for PgSession {
    async fn get(&mut self, entity: &EntityDescriptor, id: i64) -> Result<Option<Record>, AppError> {
        let q = select_by_id(entity, &self.schema, id);
        Ok(self.fetch_optional(entity, &q).await?)
    }

    async fn query(&mut self, entity: &EntityDescriptor, filters: &[Filter]) -> Result<Vec<Record>, AppError> {
        let q = select_list(entity, &self.schema, filters);
        Ok(self.fetch_all(entity, &q).await?)
    }

    async fn add(&mut self, entity: &EntityDescriptor, record: &mut Record) -> Result<(), AppError> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        let (q, id) = match record_id(record) {
            Some(id) => (update(entity, &self.schema, id, record), Some(id)),
            None => (insert(entity, &self.schema, record), None),
        };
        let written = self.fetch_optional(entity, &q).await.map_err(map_write_error)?;
        match (written, id) {
            (Some(row), _) => {
                *record = row;
                Ok(())
            }
            (None, Some(id)) => Err(AppError::not_found(entity.name(), id)),
            (None, None) => Err(AppError::Db(sqlx::Error::RowNotFound)),
        }
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        if let Some(tx) = self.tx.take() {
            tracing::debug!("commit");
            tx.commit().await.map_err(map_write_error)?;
        }
        Ok(())
    }

    async fn refresh(&mut self, entity: &EntityDescriptor, record: &mut Record) -> Result<(), AppError> {
        let id = record_id(record).ok_or_else(|| {
            AppError::Validation(format!("{}: cannot refresh a record without {}", entity.name(), ID_FIELD))
        })?;
        let fresh = self
            .get(entity, id)
            .await?
            .ok_or_else(|| AppError::not_found(entity.name(), id))?;
        *record = fresh;
        Ok(())
    }
}

/// Integrity (SQLSTATE class 23) and data (class 22) errors are the client's fault: report them as
/// validation failures carrying the server's message. Everything else stays a database error.
pub(crate) fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        let code = db.code();
        let client_fault = matches!(
            db.kind(),
            sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation
        ) || code
            .as_deref()
            .map(|c| c.starts_with("22") || c.starts_with("23"))
            .unwrap_or(false);
        if client_fault {
            return AppError::Validation(db.message().to_string());
        }
    }
    AppError::Db(e)
}

/// Decode every descriptor field; a column that cannot be decoded fails the whole row.
fn row_to_record(entity: &EntityDescriptor, row: &PgRow) -> Result<Record, sqlx::Error> {
    let mut map = Record::new();
    for f in entity.fields() {
        map.insert(f.name.clone(), cell_to_value(row, &f.name, f.ty)?);
    }
    Ok(map)
}

fn cell_to_value(row: &PgRow, name: &str, ty: FieldType) -> Result<Value, sqlx::Error> {
    use sqlx::Row;
    let value = match ty {
        FieldType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
        FieldType::Float => row.try_get::<Option<f64>, _>(name)?.map(Value::from),
        FieldType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        FieldType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        FieldType::Timestamp => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(format_timestamp(d))),
    };
    Ok(value.unwrap_or(Value::Null))
}
