//! Parameter binding utilities
//!
//! Converts JSON column values into [`BindValue`]s.

use crate::types::BindValue;
use serde_json::Value;

/// Classify a JSON value for binding.
///
/// RFC 3339 strings become timestamps so they bind against timestamp columns;
/// arrays and objects are bound as JSON.
pub fn to_bind_value(value: &Value) -> BindValue {
    match value {
        Value::Null => BindValue::Null,
        Value::Bool(b) => BindValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                BindValue::BigInt(i)
            } else if let Some(f) = n.as_f64() {
                BindValue::Double(f)
            } else {
                BindValue::Json(Value::Number(n.clone()))
            }
        }
        Value::String(s) => match chrono::DateTime::parse_from_rfc3339(s) {
            Ok(dt) => BindValue::Timestamp(dt.with_timezone(&chrono::Utc)),
            Err(_) => BindValue::Text(s.clone()),
        },
        other => BindValue::Json(other.clone()),
    }
}

pub fn to_bind_values(values: &[Value]) -> Vec<BindValue> {
    values.iter().map(to_bind_value).collect()
}
