//! Builds parameterized SELECT, INSERT, UPDATE from an entity descriptor.

use crate::config::{EntityDescriptor, CREATED_AT_FIELD, DELETED_AT_FIELD, ID_FIELD};
use crate::gateway::Filter;
use crate::schema::Record;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from descriptors).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder cast to the column type, e.g. `$2::bigint`.
    fn placeholder(&mut self, entity: &EntityDescriptor, column: &str, v: Value) -> String {
        let n = self.push_param(v);
        match entity.field(column) {
            Some(f) => format!("${}::{}", n, f.ty.pg_type()),
            None => format!("${}", n),
        }
    }
}

/// Every declared column, in descriptor order.
fn select_column_list(entity: &EntityDescriptor) -> String {
    entity
        .fields()
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key.
pub fn select_by_id(entity: &EntityDescriptor, schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.table_name());
    let ph = q.placeholder(entity, ID_FIELD, Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(entity),
        table,
        quoted(ID_FIELD),
        ph
    );
    q
}

/// SELECT with ANDed predicates, ORDER BY id. Filters on unknown columns are skipped.
pub fn select_list(entity: &EntityDescriptor, schema: &str, filters: &[Filter]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.table_name());
    let mut where_parts = Vec::new();
    for filter in filters {
        match filter {
            Filter::Eq(col, val) => {
                if entity.field(col).is_none() {
                    continue;
                }
                let ph = q.placeholder(entity, col, val.clone());
                where_parts.push(format!("{} = {}", quoted(col), ph));
            }
            Filter::IsNull(col) => {
                if entity.field(col).is_none() {
                    continue;
                }
                where_parts.push(format!("{} IS NULL", quoted(col)));
            }
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        select_column_list(entity),
        table,
        where_clause,
        quoted(ID_FIELD)
    );
    q
}

/// INSERT the record's columns (never `id`); columns absent from the record take their DB default.
pub fn insert(entity: &EntityDescriptor, schema: &str, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.table_name());
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in entity.fields() {
        if f.name == ID_FIELD {
            continue;
        }
        let Some(val) = record.get(&f.name) else { continue };
        placeholders.push(q.placeholder(entity, &f.name, val.clone()));
        cols.push(quoted(&f.name));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            table,
            select_column_list(entity)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(entity)
        )
    };
    q
}

/// UPDATE by id: SET every record column except `id` and `created_at`.
/// When the record is active (`deleted_at` null) the row must still be active too, so a
/// concurrent soft-delete is never undone; such an update returns no row.
pub fn update(entity: &EntityDescriptor, schema: &str, id: i64, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, entity.table_name());
    let mut sets = Vec::new();
    for f in entity.fields() {
        if f.name == ID_FIELD || f.name == CREATED_AT_FIELD {
            continue;
        }
        let Some(val) = record.get(&f.name) else { continue };
        let ph = q.placeholder(entity, &f.name, val.clone());
        sets.push(format!("{} = {}", quoted(&f.name), ph));
    }
    let id_ph = q.placeholder(entity, ID_FIELD, Value::from(id));
    let mut where_clause = format!("{} = {}", quoted(ID_FIELD), id_ph);
    let active = record.get(DELETED_AT_FIELD).map(Value::is_null).unwrap_or(true);
    if active {
        where_clause.push_str(&format!(" AND {} IS NULL", quoted(DELETED_AT_FIELD)));
    }
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {}",
            select_column_list(entity),
            table,
            where_clause
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        table,
        sets.join(", "),
        where_clause,
        select_column_list(entity)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDef, FieldType};
    use serde_json::json;

    fn team() -> EntityDescriptor {
        EntityDescriptor::new(
            "Team",
            vec![
                FieldDef::required("name", FieldType::Text),
                FieldDef::optional("description", FieldType::Text),
            ],
        )
        .unwrap()
    }

    const COLS: &str = "\"id\", \"created_at\", \"updated_at\", \"deleted_at\", \"name\", \"description\"";

    #[test]
    fn select_by_id_casts_the_key() {
        let q = select_by_id(&team(), "public", 7);
        assert_eq!(
            q.sql,
            format!("SELECT {} FROM \"public\".\"teams\" WHERE \"id\" = $1::bigint", COLS)
        );
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn select_list_ands_filters_and_skips_unknown_columns() {
        let q = select_list(
            &team(),
            "public",
            &[
                Filter::Eq("name".into(), json!("Ops")),
                Filter::Eq("bogus".into(), json!(1)),
                Filter::IsNull("deleted_at".into()),
            ],
        );
        assert_eq!(
            q.sql,
            format!(
                "SELECT {} FROM \"public\".\"teams\" WHERE \"name\" = $1::text AND \"deleted_at\" IS NULL ORDER BY \"id\"",
                COLS
            )
        );
        assert_eq!(q.params, vec![json!("Ops")]);
    }

    #[test]
    fn insert_skips_id_and_absent_columns() {
        let mut rec = Record::new();
        rec.insert("id".into(), Value::Null);
        rec.insert("name".into(), json!("Ops"));
        rec.insert("created_at".into(), json!("2024-01-01T00:00:00Z"));
        let q = insert(&team(), "app", &rec);
        assert_eq!(
            q.sql,
            format!(
                "INSERT INTO \"app\".\"teams\" (\"created_at\", \"name\") VALUES ($1::timestamptz, $2::text) RETURNING {}",
                COLS
            )
        );
        assert_eq!(q.params, vec![json!("2024-01-01T00:00:00Z"), json!("Ops")]);
    }

    #[test]
    fn update_of_active_record_guards_against_soft_deleted_rows() {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(3));
        rec.insert("created_at".into(), json!("2024-01-01T00:00:00Z"));
        rec.insert("name".into(), json!("Ops"));
        rec.insert("deleted_at".into(), Value::Null);
        let q = update(&team(), "public", 3, &rec);
        assert_eq!(
            q.sql,
            format!(
                "UPDATE \"public\".\"teams\" SET \"deleted_at\" = $1::timestamptz, \"name\" = $2::text WHERE \"id\" = $3::bigint AND \"deleted_at\" IS NULL RETURNING {}",
                COLS
            )
        );
        assert_eq!(q.params, vec![Value::Null, json!("Ops"), json!(3)]);
    }

    #[test]
    fn soft_delete_update_has_no_active_guard() {
        let mut rec = Record::new();
        rec.insert("deleted_at".into(), json!("2024-02-01T00:00:00Z"));
        let q = update(&team(), "public", 3, &rec);
        assert!(q.sql.ends_with(&format!("WHERE \"id\" = $2::bigint RETURNING {}", COLS)));
    }
}
