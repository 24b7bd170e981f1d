//! Convert serde_json::Value to a value sqlx can bind.
//!
//! Every value is sent as text; placeholders carry an explicit cast (`$1::bigint`) so
//! PostgreSQL converts it to the column type.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Json(Value),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    PgBindValue::U64(u)
                } else if let Some(f) = n.as_f64() {
                    PgBindValue::F64(f)
                } else {
                    PgBindValue::String(n.to_string())
                }
            }
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }

    /// Text form sent to PostgreSQL; None for SQL NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PgBindValue::Null => None,
            PgBindValue::Bool(b) => Some(b.to_string()),
            PgBindValue::I64(n) => Some(n.to_string()),
            PgBindValue::U64(n) => Some(n.to_string()),
            PgBindValue::F64(n) => Some(n.to_string()),
            PgBindValue::String(s) => Some(s.clone()),
            PgBindValue::Json(v) => Some(v.to_string()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self.as_text() {
            None => Ok(IsNull::Yes),
            Some(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
        }
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_render_as_text() {
        assert_eq!(PgBindValue::from_json(&json!(null)).as_text(), None);
        assert_eq!(PgBindValue::from_json(&json!(true)).as_text().as_deref(), Some("true"));
        assert_eq!(PgBindValue::from_json(&json!(42)).as_text().as_deref(), Some("42"));
        assert_eq!(PgBindValue::from_json(&json!(2.5)).as_text().as_deref(), Some("2.5"));
        assert_eq!(
            PgBindValue::from_json(&json!(u64::MAX)).as_text().as_deref(),
            Some("18446744073709551615")
        );
        assert_eq!(
            PgBindValue::from_json(&json!("2024-01-01T00:00:00Z")).as_text().as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }
}
