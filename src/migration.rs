//! Create the collection tables: one table per descriptor, parents before children.
//! Idempotent (CREATE ... IF NOT EXISTS); existing tables are never altered.

use crate::config::{EntityDescriptor, FieldDef, FieldDefault, ID_FIELD};
use crate::error::{AppError, ConfigError};
use crate::sql::{qualified_table, quoted};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;

/// SQL DEFAULT expression; None for a null default (the column default already).
fn default_literal(default: &FieldDefault) -> Option<String> {
    match default {
        FieldDefault::Now => Some("NOW()".into()),
        FieldDefault::Value(Value::Null) => None,
        FieldDefault::Value(Value::String(s)) => Some(format!("'{}'", s.replace('\'', "''"))),
        FieldDefault::Value(v) => Some(v.to_string()),
    }
}

fn column_sql(schema: &str, field: &FieldDef) -> String {
    if field.name == ID_FIELD {
        return format!("{} BIGSERIAL PRIMARY KEY", quoted(ID_FIELD));
    }
    let mut col = format!("{} {}", quoted(&field.name), field.ty.pg_type());
    if !field.nullable {
        col.push_str(" NOT NULL");
    }
    if let Some(literal) = field.default.as_ref().and_then(default_literal) {
        col.push_str(&format!(" DEFAULT {}", literal));
    }
    if field.unique {
        col.push_str(" UNIQUE");
    }
    if let Some(table) = &field.references {
        col.push_str(&format!(
            " REFERENCES {} ({})",
            qualified_table(schema, table),
            quoted(ID_FIELD)
        ));
    }
    col
}

/// CREATE TABLE IF NOT EXISTS for one descriptor.
pub fn create_table_sql(schema: &str, entity: &EntityDescriptor) -> String {
    let columns: Vec<String> = entity.fields().iter().map(|f| column_sql(schema, f)).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_table(schema, entity.table_name()),
        columns.join(", ")
    )
}

/// Order descriptors so every referenced table comes first. References to tables outside the
/// set are assumed to exist already. A reference cycle is a configuration error.
pub fn dependency_order(entities: &[Arc<EntityDescriptor>]) -> Result<Vec<Arc<EntityDescriptor>>, ConfigError> {
    let in_set: HashSet<&str> = entities.iter().map(|e| e.table_name()).collect();
    let mut created: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(entities.len());
    let mut remaining: Vec<&Arc<EntityDescriptor>> = entities.iter().collect();
    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|e| {
            let ready = e
                .referenced_tables()
                .all(|t| t == e.table_name() || !in_set.contains(t) || created.contains(t));
            if ready {
                created.insert(e.table_name().to_string());
                ordered.push(Arc::clone(e));
            }
            !ready
        });
        if remaining.len() == before {
            let tables: Vec<&str> = remaining.iter().map(|e| e.table_name()).collect();
            return Err(ConfigError::ForeignKeyCycle(tables.join(", ")));
        }
    }
    Ok(ordered)
}

/// Create `schema` and every collection table in it.
pub async fn ensure_tables(pool: &PgPool, schema: &str, entities: &[Arc<EntityDescriptor>]) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for entity in dependency_order(entities)? {
        let ddl = create_table_sql(schema, &entity);
        tracing::debug!(sql = %ddl, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
    }
    tracing::info!(schema = %schema, tables = entities.len(), "collection tables ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldType;
    use serde_json::json;

    fn entity(name: &str, fields: Vec<FieldDef>) -> Arc<EntityDescriptor> {
        Arc::new(EntityDescriptor::new(name, fields).unwrap())
    }

    #[test]
    fn table_ddl_covers_base_fields_and_constraints() {
        let user = entity(
            "User",
            vec![
                FieldDef::required("email", FieldType::Text).unique(),
                FieldDef::required("is_admin", FieldType::Boolean).with_default(json!(false)),
                FieldDef::optional("team_id", FieldType::Integer).references("teams"),
                FieldDef::optional("nick", FieldType::Text).with_default(json!("o'neil")),
            ],
        );
        assert_eq!(
            create_table_sql("app", &user),
            "CREATE TABLE IF NOT EXISTS \"app\".\"users\" (\
             \"id\" BIGSERIAL PRIMARY KEY, \
             \"created_at\" timestamptz NOT NULL, \
             \"updated_at\" timestamptz DEFAULT NOW(), \
             \"deleted_at\" timestamptz, \
             \"email\" text NOT NULL UNIQUE, \
             \"is_admin\" boolean NOT NULL DEFAULT false, \
             \"team_id\" bigint REFERENCES \"app\".\"teams\" (\"id\"), \
             \"nick\" text DEFAULT 'o''neil')"
        );
    }

    #[test]
    fn parents_are_created_first() {
        let link = entity(
            "Membership",
            vec![
                FieldDef::optional("user_id", FieldType::Integer).references("users"),
                FieldDef::optional("group_id", FieldType::Integer).references("groups"),
            ],
        );
        let user = entity("User", vec![]);
        let group = entity("Group", vec![]);
        let order = dependency_order(&[link, user, group]).unwrap();
        let names: Vec<&str> = order.iter().map(|e| e.table_name()).collect();
        assert_eq!(names, ["users", "groups", "memberships"]);
    }

    #[test]
    fn reference_cycles_are_rejected() {
        let a = entity("Alpha", vec![FieldDef::optional("beta_id", FieldType::Integer).references("betas")]);
        let b = entity("Beta", vec![FieldDef::optional("alpha_id", FieldType::Integer).references("alphas")]);
        assert!(matches!(dependency_order(&[a, b]), Err(ConfigError::ForeignKeyCycle(_))));
    }
}
