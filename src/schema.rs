//! Input/output schemas derived from an entity descriptor.
//!
//! The input schema is what clients may send (server-assigned fields removed); the output
//! schema is what they get back (soft-delete metadata and declared exclusions removed).

use crate::config::{EntityDescriptor, FieldDef};
use serde_json::{Map, Value};

/// A stored row or payload: field name -> JSON value.
pub type Record = Map<String, Value>;

pub const INPUT_EXCLUDED_FIELDS: [&str; 4] = ["id", "deleted_at", "updated_at", "created_at"];
pub const OUTPUT_EXCLUDED_FIELDS: [&str; 1] = ["deleted_at"];

/// How a payload is checked against the input schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaMode {
    /// Create and replace: required fields enforced, omitted fields take their default.
    Full,
    /// Partial update: only supplied fields are kept.
    Partial,
}

#[derive(Debug, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Schema {
            name: name.into(),
            fields,
        }
    }

    /// Component name, e.g. "SeverityInput" or "Severity".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Keep only this schema's fields. Missing fields are emitted as null.
    pub fn project(&self, record: &Record) -> Record {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), record.get(&f.name).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

pub(crate) fn derive_input(entity: &EntityDescriptor) -> Schema {
    let fields = entity
        .fields()
        .iter()
        .filter(|f| !INPUT_EXCLUDED_FIELDS.contains(&f.name.as_str()))
        .cloned()
        .collect();
    Schema::new(format!("{}Input", entity.name()), fields)
}

pub(crate) fn derive_output(entity: &EntityDescriptor) -> Schema {
    let excluded = entity.excluded_fields();
    let fields = entity
        .fields()
        .iter()
        .filter(|f| !excluded.contains(&f.name))
        .cloned()
        .collect();
    Schema::new(entity.name(), fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldType;
    use serde_json::json;

    fn rank(name: &str) -> EntityDescriptor {
        EntityDescriptor::new(
            name,
            vec![
                FieldDef::required("name", FieldType::Text),
                FieldDef::required("description", FieldType::Text),
                FieldDef::required("value", FieldType::Integer),
                FieldDef::required("example", FieldType::Text),
            ],
        )
        .unwrap()
    }

    #[test]
    fn input_schema_drops_server_assigned_fields() {
        let d = rank("Severity");
        let input = d.input_schema();
        assert_eq!(input.name(), "SeverityInput");
        assert_eq!(
            input.field_names().collect::<Vec<_>>(),
            ["name", "description", "value", "example"]
        );
    }

    #[test]
    fn output_schema_drops_only_deleted_at() {
        let d = rank("Impact");
        let output = d.output_schema();
        assert_eq!(output.name(), "Impact");
        assert_eq!(
            output.field_names().collect::<Vec<_>>(),
            ["id", "created_at", "updated_at", "name", "description", "value", "example"]
        );
        assert!(!output.contains("deleted_at"));
    }

    #[test]
    fn declared_exclusions_are_hidden_from_output_only() {
        let d = EntityDescriptor::with_exclusions(
            "Account",
            vec![FieldDef::optional("secret", FieldType::Text)],
            &["secret"],
        )
        .unwrap();
        assert!(d.input_schema().contains("secret"));
        assert!(!d.output_schema().contains("secret"));
    }

    #[test]
    fn project_keeps_schema_fields() {
        let d = rank("Likelihood");
        let mut row = Record::new();
        row.insert("deleted_at".into(), json!(null));
        row.insert("value".into(), json!(2));
        row.insert("id".into(), json!(9));
        let out = d.output_schema().project(&row);
        assert!(!out.contains_key("deleted_at"));
        assert_eq!(out["id"], json!(9));
        assert_eq!(out["value"], json!(2));
        assert_eq!(out.len(), 7);
    }
}
