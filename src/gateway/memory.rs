//! In-process gateway: tables are maps behind a lock, writes are staged per session and
//! applied atomically on commit. Enforces unique fields and foreign keys like the SQL schema.

use super::{record_id, Filter, Gateway, Session};
use crate::config::{EntityDescriptor, FieldDef, DELETED_AT_FIELD, ID_FIELD};
use crate::error::AppError;
use crate::schema::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

type Tables = HashMap<String, Table>;

#[derive(Clone, Default)]
pub struct MemoryGateway {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows in `table`, soft-deleted included.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn session(&self) -> Result<Box<dyn Session>, AppError> {
        Ok(Box::new(MemorySession {
            tables: self.tables.clone(),
            pending: Vec::new(),
        }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

struct PendingWrite {
    entity: String,
    table: String,
    fields: Vec<FieldDef>,
    record: Record,
}

pub struct MemorySession {
    tables: Arc<RwLock<Tables>>,
    pending: Vec<PendingWrite>,
}

impl MemorySession {
    fn staged(&self, table: &str, id: i64) -> Option<&Record> {
        self.pending
            .iter()
            .rev()
            .find(|w| w.table == table && record_id(&w.record) == Some(id))
            .map(|w| &w.record)
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn get(&mut self, entity: &EntityDescriptor, id: i64) -> Result<Option<Record>, AppError> {
        if let Some(r) = self.staged(entity.table_name(), id) {
            return Ok(Some(r.clone()));
        }
        let tables = self.tables.read().await;
        Ok(tables
            .get(entity.table_name())
            .and_then(|t| t.rows.get(&id))
            .cloned())
    }

    async fn query(&mut self, entity: &EntityDescriptor, filters: &[Filter]) -> Result<Vec<Record>, AppError> {
        let mut rows: BTreeMap<i64, Record> = {
            let tables = self.tables.read().await;
            tables
                .get(entity.table_name())
                .map(|t| t.rows.clone())
                .unwrap_or_default()
        };
        for w in self.pending.iter().filter(|w| w.table == entity.table_name()) {
            if let Some(id) = record_id(&w.record) {
                rows.insert(id, w.record.clone());
            }
        }
        Ok(rows
            .into_values()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .collect())
    }

    async fn add(&mut self, entity: &EntityDescriptor, record: &mut Record) -> Result<(), AppError> {
        let table = entity.table_name().to_string();
        match record_id(record) {
            Some(id) => {
                let current = match self.staged(&table, id) {
                    Some(r) => Some(r.clone()),
                    None => self.tables.read().await.get(&table).and_then(|t| t.rows.get(&id)).cloned(),
                };
                let Some(current) = current else {
                    return Err(AppError::not_found(entity.name(), id));
                };
                let stored_active = current.get(DELETED_AT_FIELD).map(Value::is_null).unwrap_or(true);
                let incoming_active = record.get(DELETED_AT_FIELD).map(Value::is_null).unwrap_or(true);
                if !stored_active && incoming_active {
                    return Err(AppError::not_found(entity.name(), id));
                }
            }
            None => {
                let mut tables = self.tables.write().await;
                let t = tables.entry(table.clone()).or_default();
                t.next_id += 1;
                record.insert(ID_FIELD.into(), Value::from(t.next_id));
            }
        }
        for f in entity.fields() {
            record.entry(f.name.clone()).or_insert(Value::Null);
        }
        self.pending.retain(|w| !(w.table == table && record_id(&w.record) == record_id(record)));
        self.pending.push(PendingWrite {
            entity: entity.name().to_string(),
            table,
            fields: entity.fields().to_vec(),
            record: record.clone(),
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let pending = std::mem::take(&mut self.pending);
        let mut tables = self.tables.write().await;
        for w in &pending {
            check_still_active(&tables, w)?;
            check_constraints(&tables, &pending, w)?;
        }
        for w in pending {
            if let Some(id) = record_id(&w.record) {
                tables.entry(w.table).or_default().rows.insert(id, w.record);
            }
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

/// A staged write must not reactivate a row that was soft deleted after it was staged.
fn check_still_active(tables: &Tables, w: &PendingWrite) -> Result<(), AppError> {
    let Some(id) = record_id(&w.record) else { return Ok(()) };
    let Some(stored) = tables.get(&w.table).and_then(|t| t.rows.get(&id)) else {
        return Ok(());
    };
    let stored_deleted = stored.get(DELETED_AT_FIELD).map(|v| !v.is_null()).unwrap_or(false);
    let incoming_active = w.record.get(DELETED_AT_FIELD).map(Value::is_null).unwrap_or(true);
    if stored_deleted && incoming_active {
        return Err(AppError::not_found(&w.entity, id));
    }
    Ok(())
}

/// Unique, not-null and foreign key checks for one staged write against committed rows and the
/// rest of the batch. Messages mirror PostgreSQL's wording.
fn check_constraints(tables: &Tables, batch: &[PendingWrite], w: &PendingWrite) -> Result<(), AppError> {
    let id = record_id(&w.record);
    for f in &w.fields {
        let value = w.record.get(&f.name).unwrap_or(&Value::Null);
        if value.is_null() {
            if !f.nullable && f.name != ID_FIELD {
                return Err(AppError::Validation(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    f.name, w.table
                )));
            }
            continue;
        }
        if f.unique {
            let committed = tables
                .get(&w.table)
                .map(|t| t.rows.values().any(|r| record_id(r) != id && r.get(&f.name) == Some(value)))
                .unwrap_or(false);
            let staged = batch
                .iter()
                .any(|o| o.table == w.table && record_id(&o.record) != id && o.record.get(&f.name) == Some(value));
            if committed || staged {
                return Err(AppError::Validation(format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    w.table, f.name
                )));
            }
        }
        if let Some(target) = f.references.as_deref() {
            let Some(target_id) = value.as_i64() else { continue };
            let committed = tables
                .get(target)
                .map(|t| t.rows.contains_key(&target_id))
                .unwrap_or(false);
            let staged = batch
                .iter()
                .any(|o| o.table == target && record_id(&o.record) == Some(target_id));
            if !committed && !staged {
                return Err(AppError::Validation(format!(
                    "insert or update on table \"{}\" violates foreign key constraint \"{}_{}_fkey\" ({} {})",
                    w.table, w.table, f.name, w.entity, target_id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldType;
    use serde_json::json;

    fn account() -> EntityDescriptor {
        EntityDescriptor::new("Account", vec![FieldDef::required("login", FieldType::Text).unique()]).unwrap()
    }

    fn rec(login: &str) -> Record {
        let mut r = Record::new();
        r.insert("login".into(), json!(login));
        r.insert("created_at".into(), json!("2024-01-01T00:00:00Z"));
        r
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let gw = MemoryGateway::new();
        let d = account();
        let mut s1 = gw.session().await.unwrap();
        let mut r = rec("ann");
        s1.add(&d, &mut r).await.unwrap();
        assert_eq!(r["id"], json!(1));

        let mut s2 = gw.session().await.unwrap();
        assert!(s2.get(&d, 1).await.unwrap().is_none());
        s1.commit().await.unwrap();
        assert_eq!(s2.get(&d, 1).await.unwrap().unwrap()["login"], json!("ann"));
    }

    #[tokio::test]
    async fn dropped_session_discards_writes() {
        let gw = MemoryGateway::new();
        let d = account();
        {
            let mut s = gw.session().await.unwrap();
            s.add(&d, &mut rec("ann")).await.unwrap();
        }
        assert_eq!(gw.row_count("accounts").await, 0);
    }

    #[tokio::test]
    async fn unique_violation_fails_commit() {
        let gw = MemoryGateway::new();
        let d = account();
        let mut s = gw.session().await.unwrap();
        s.add(&d, &mut rec("ann")).await.unwrap();
        s.commit().await.unwrap();

        let mut s = gw.session().await.unwrap();
        s.add(&d, &mut rec("ann")).await.unwrap();
        let err = s.commit().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("unique")), "{:?}", err);
        assert_eq!(gw.row_count("accounts").await, 1);
    }

    #[tokio::test]
    async fn dangling_foreign_key_fails_commit() {
        let gw = MemoryGateway::new();
        let d = EntityDescriptor::new(
            "Membership",
            vec![FieldDef::optional("account_id", FieldType::Integer).references("accounts")],
        )
        .unwrap();
        let mut s = gw.session().await.unwrap();
        let mut r = Record::new();
        r.insert("created_at".into(), json!("2024-01-01T00:00:00Z"));
        r.insert("account_id".into(), json!(99));
        s.add(&d, &mut r).await.unwrap();
        assert!(matches!(s.commit().await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn reactivating_a_soft_deleted_row_is_refused() {
        let gw = MemoryGateway::new();
        let d = account();
        let mut s = gw.session().await.unwrap();
        let mut r = rec("ann");
        s.add(&d, &mut r).await.unwrap();
        r.insert("deleted_at".into(), json!("2024-02-01T00:00:00Z"));
        s.add(&d, &mut r).await.unwrap();
        s.commit().await.unwrap();

        let mut s = gw.session().await.unwrap();
        r.insert("deleted_at".into(), Value::Null);
        assert!(matches!(s.add(&d, &mut r).await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn stale_update_cannot_undo_a_concurrent_soft_delete() {
        let gw = MemoryGateway::new();
        let d = account();
        let mut s = gw.session().await.unwrap();
        s.add(&d, &mut rec("ann")).await.unwrap();
        s.commit().await.unwrap();

        let mut editor = gw.session().await.unwrap();
        let mut edited = editor.get(&d, 1).await.unwrap().unwrap();
        edited.insert("login".into(), json!("anne"));
        editor.add(&d, &mut edited).await.unwrap();

        let mut deleter = gw.session().await.unwrap();
        let mut gone = deleter.get(&d, 1).await.unwrap().unwrap();
        gone.insert("deleted_at".into(), json!("2024-02-01T00:00:00Z"));
        deleter.add(&d, &mut gone).await.unwrap();
        deleter.commit().await.unwrap();

        let err = editor.commit().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref entity, id: 1 } if entity == "Account"), "{:?}", err);
        let mut s = gw.session().await.unwrap();
        let stored = s.get(&d, 1).await.unwrap().unwrap();
        assert_eq!(stored["deleted_at"], json!("2024-02-01T00:00:00Z"));
        assert_eq!(stored["login"], json!("ann"));
    }
}
