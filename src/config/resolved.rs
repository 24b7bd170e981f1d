//! Resolved entity descriptor: declared fields plus the server-assigned base fields, with
//! derived input/output schemas memoized on first use.

use crate::case::{dasherize, tableize, underscore};
use crate::config::types::{FieldDef, FieldType};
use crate::config::validator::validate_descriptor;
use crate::error::ConfigError;
use crate::schema::{self, Schema, OUTPUT_EXCLUDED_FIELDS};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";
pub const UPDATED_AT_FIELD: &str = "updated_at";
pub const DELETED_AT_FIELD: &str = "deleted_at";

/// Fields every collection carries; assigned by the server, never declared by an entity.
pub fn base_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::optional(ID_FIELD, FieldType::Integer),
        FieldDef::required(CREATED_AT_FIELD, FieldType::Timestamp),
        FieldDef::optional(UPDATED_AT_FIELD, FieldType::Timestamp).default_now(),
        FieldDef::optional(DELETED_AT_FIELD, FieldType::Timestamp),
    ]
}

pub struct EntityDescriptor {
    name: String,
    table_name: String,
    fields: Vec<FieldDef>,
    /// Fields hidden from responses and list filters; always includes `deleted_at`.
    excluded: BTreeSet<String>,
    input: OnceLock<Arc<Schema>>,
    output: OnceLock<Arc<Schema>>,
}

impl EntityDescriptor {
    /// Build a descriptor from a type name and its domain fields. The table name is the tableized type name.
    pub fn new(name: &str, domain_fields: Vec<FieldDef>) -> Result<Self, ConfigError> {
        Self::with_exclusions(name, domain_fields, &[])
    }

    /// Like [`EntityDescriptor::new`], additionally hiding `exclude` from output and filters.
    pub fn with_exclusions(
        name: &str,
        domain_fields: Vec<FieldDef>,
        exclude: &[&str],
    ) -> Result<Self, ConfigError> {
        validate_descriptor(name, &domain_fields, exclude)?;
        let mut fields = base_fields();
        fields.extend(domain_fields);
        let mut excluded: BTreeSet<String> = exclude.iter().map(|s| s.to_string()).collect();
        for f in OUTPUT_EXCLUDED_FIELDS {
            excluded.insert(f.to_string());
        }
        Ok(EntityDescriptor {
            name: name.to_string(),
            table_name: tableize(name),
            fields,
            excluded,
            input: OnceLock::new(),
            output: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// URL segment: dasherized table name ("user-team-links").
    pub fn path_segment(&self) -> String {
        dasherize(&self.table_name)
    }

    /// Singular snake form used in operation ids ("user_team_link").
    pub fn singular(&self) -> String {
        underscore(&self.name)
    }

    /// All fields, base fields first.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn excluded_fields(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    /// Accepted on create/replace/patch. Same `Arc` on every call.
    pub fn input_schema(&self) -> Arc<Schema> {
        self.input
            .get_or_init(|| Arc::new(schema::derive_input(self)))
            .clone()
    }

    /// Returned to clients and filterable on list. Same `Arc` on every call.
    pub fn output_schema(&self) -> Arc<Schema> {
        self.output
            .get_or_init(|| Arc::new(schema::derive_output(self)))
            .clone()
    }

    /// Tables this entity references through foreign keys.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| f.references.as_deref())
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>())
            .field("excluded", &self.excluded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn severity() -> EntityDescriptor {
        EntityDescriptor::new(
            "Severity",
            vec![
                FieldDef::required("name", FieldType::Text),
                FieldDef::required("value", FieldType::Integer),
            ],
        )
        .unwrap()
    }

    #[test]
    fn names_follow_inflection() {
        let d = severity();
        assert_eq!(d.table_name(), "severities");
        assert_eq!(d.path_segment(), "severities");
        assert_eq!(d.singular(), "severity");
    }

    #[test]
    fn base_fields_come_first() {
        let d = severity();
        let names: Vec<&str> = d.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "created_at", "updated_at", "deleted_at", "name", "value"]);
    }

    #[test]
    fn schemas_are_memoized() {
        let d = severity();
        assert!(Arc::ptr_eq(&d.input_schema(), &d.input_schema()));
        assert!(Arc::ptr_eq(&d.output_schema(), &d.output_schema()));
    }

    #[test]
    fn deleted_at_is_always_excluded() {
        let d = EntityDescriptor::with_exclusions(
            "Account",
            vec![
                FieldDef::required("login", FieldType::Text),
                FieldDef::optional("secret", FieldType::Text),
            ],
            &["secret"],
        )
        .unwrap();
        let excluded: Vec<&str> = d.excluded_fields().iter().map(String::as_str).collect();
        assert_eq!(excluded, ["deleted_at", "secret"]);
    }
}
