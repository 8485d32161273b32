//! Type mapping definitions
//!
//! Schema descriptors for table columns and the value shapes handed to a
//! database driver when binding parameters.

use serde::{Deserialize, Serialize};

/// Logical column type used by schema descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Boolean,
    Varchar,
    Text,
    Timestamp,
    Date,
    Json,
    Uuid,
}

/// Column descriptor: `{type, length, ...}` for one schema field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: ColumnKind,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Raw SQL default expression, e.g. `0` or `CURRENT_TIMESTAMP`
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
}

fn default_nullable() -> bool {
    true
}

impl FieldSpec {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            length: None,
            nullable: true,
            default: None,
            auto_increment: false,
        }
    }

    pub fn integer() -> Self {
        Self::new(ColumnKind::Integer)
    }

    pub fn big_integer() -> Self {
        Self::new(ColumnKind::BigInt)
    }

    pub fn varchar(length: u32) -> Self {
        Self::new(ColumnKind::Varchar).with_length(length)
    }

    pub fn text() -> Self {
        Self::new(ColumnKind::Text)
    }

    pub fn boolean() -> Self {
        Self::new(ColumnKind::Boolean)
    }

    pub fn timestamp() -> Self {
        Self::new(ColumnKind::Timestamp)
    }

    pub fn json() -> Self {
        Self::new(ColumnKind::Json)
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.nullable = false;
        self
    }
}

/// Driver-facing parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Boolean(bool),
    BigInt(i64),
    Double(f64),
    Text(String),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Json(serde_json::Value),
}

impl From<bool> for BindValue {
    fn from(val: bool) -> Self {
        BindValue::Boolean(val)
    }
}

impl From<i64> for BindValue {
    fn from(val: i64) -> Self {
        BindValue::BigInt(val)
    }
}

impl From<f64> for BindValue {
    fn from(val: f64) -> Self {
        BindValue::Double(val)
    }
}

impl From<String> for BindValue {
    fn from(val: String) -> Self {
        BindValue::Text(val)
    }
}

impl From<&str> for BindValue {
    fn from(val: &str) -> Self {
        BindValue::Text(val.to_string())
    }
}

impl<T> From<Option<T>> for BindValue
where
    T: Into<BindValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => BindValue::Null,
        }
    }
}

/// How a result column should be decoded back into a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Boolean,
    Text,
    TimestampTz,
    Timestamp,
    Date,
    Uuid,
    Json,
    /// Unknown type; decoded as text when possible
    Other,
}
