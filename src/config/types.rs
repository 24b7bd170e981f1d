//! Field declarations for collection entities: type, nullability, default, constraints.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage/wire type of a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Boolean,
    /// RFC 3339 string on the wire, TIMESTAMPTZ in PostgreSQL.
    Timestamp,
}

impl FieldType {
    /// PostgreSQL type used for DDL and parameter casts.
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "bigint",
            FieldType::Float => "double precision",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamptz",
        }
    }

    /// Human-readable name for validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Integer => "an integer",
            FieldType::Float => "a number",
            FieldType::Text => "a string",
            FieldType::Boolean => "a boolean",
            FieldType::Timestamp => "an RFC 3339 timestamp",
        }
    }

    /// Coerce a JSON value into this type's canonical JSON form. None when it does not fit.
    /// Null is handled by the caller (nullability is a field property, not a type property).
    pub fn coerce(&self, v: &Value) -> Option<Value> {
        match (self, v) {
            (FieldType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(Value::from(i));
                }
                // 3.0 is an integer; 3.5 is not.
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| Value::from(f as i64))
            }
            (FieldType::Float, Value::Number(n)) => n.as_f64().map(Value::from),
            (FieldType::Text, Value::String(s)) => Some(Value::String(s.clone())),
            (FieldType::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (FieldType::Timestamp, Value::String(s)) => parse_timestamp(s).map(|dt| Value::String(format_timestamp(dt))),
            _ => None,
        }
    }

    /// Parse a query-string value into this type's canonical JSON form.
    pub fn parse_str(&self, s: &str) -> Option<Value> {
        match self {
            FieldType::Integer => s.trim().parse::<i64>().ok().map(Value::from),
            FieldType::Float => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::from),
            FieldType::Text => Some(Value::String(s.to_string())),
            FieldType::Boolean => match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldType::Timestamp => parse_timestamp(s).map(|dt| Value::String(format_timestamp(dt))),
        }
    }
}

/// Parse an RFC 3339 timestamp (with offset) into UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim()).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Canonical wire form for timestamps: UTC, `Z` suffix, fractional seconds only when non-zero.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Current time in canonical wire form, at microsecond precision (what PostgreSQL stores).
pub fn timestamp_now() -> String {
    let now = Utc::now();
    let micros = now.timestamp_micros();
    let truncated = DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or(now);
    format_timestamp(truncated)
}

/// Default applied when a field is omitted from a full payload or a new record.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldDefault {
    /// A fixed JSON value (including null).
    Value(Value),
    /// Current time at construction.
    Now,
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::Value(v) => v.clone(),
            FieldDefault::Now => Value::String(timestamp_now()),
        }
    }
}

/// One declared field of a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
    /// None means the field is required in full payloads.
    pub default: Option<FieldDefault>,
    pub unique: bool,
    /// Table name this field references (foreign key to its `id`).
    pub references: Option<String>,
}

impl FieldDef {
    /// Non-null field that must be supplied on create/replace.
    pub fn required(name: &str, ty: FieldType) -> Self {
        FieldDef {
            name: name.to_string(),
            ty,
            nullable: false,
            default: None,
            unique: false,
            references: None,
        }
    }

    /// Nullable field defaulting to null.
    pub fn optional(name: &str, ty: FieldType) -> Self {
        FieldDef {
            name: name.to_string(),
            ty,
            nullable: true,
            default: Some(FieldDefault::Value(Value::Null)),
            unique: false,
            references: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(FieldDefault::Value(value));
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = Some(FieldDefault::Now);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, table: &str) -> Self {
        self.references = Some(table.to_string());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_coercion_rejects_fractions_and_strings() {
        assert_eq!(FieldType::Integer.coerce(&json!(3)), Some(json!(3)));
        assert_eq!(FieldType::Integer.coerce(&json!(3.0)), Some(json!(3)));
        assert_eq!(FieldType::Integer.coerce(&json!(3.5)), None);
        assert_eq!(FieldType::Integer.coerce(&json!("3")), None);
    }

    #[test]
    fn timestamps_are_normalized_to_utc() {
        let v = FieldType::Timestamp.coerce(&json!("2024-03-01T12:00:00+02:00"));
        assert_eq!(v, Some(json!("2024-03-01T10:00:00Z")));
        assert_eq!(FieldType::Timestamp.coerce(&json!("yesterday")), None);
    }

    #[test]
    fn query_strings_parse_per_type() {
        assert_eq!(FieldType::Integer.parse_str("7"), Some(json!(7)));
        assert_eq!(FieldType::Integer.parse_str("seven"), None);
        assert_eq!(FieldType::Boolean.parse_str("TRUE"), Some(json!(true)));
        assert_eq!(FieldType::Text.parse_str("High"), Some(json!("High")));
    }

    #[test]
    fn optional_fields_default_to_null() {
        let f = FieldDef::optional("description", FieldType::Text);
        assert!(f.nullable);
        assert!(!f.is_required());
        assert_eq!(f.default.map(|d| d.resolve()), Some(Value::Null));
        assert!(FieldDef::required("name", FieldType::Text).is_required());
    }
}
