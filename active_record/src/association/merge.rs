//! Call-time association overrides

use crate::RowData;
use serde_json::Value;

/// Adjustments applied to one association query
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AssociationOverride {
    /// Use the declared filter, sort and columns
    #[default]
    None,
    /// Replace the declared filter with a raw condition
    Condition(String),
    /// Merge `where_` over the declared filter; `sort`/`columns` replace when set
    Structured {
        where_: RowData,
        sort: Option<String>,
        columns: Option<String>,
    },
}

impl AssociationOverride {
    pub fn condition(fragment: impl Into<String>) -> Self {
        AssociationOverride::Condition(fragment.into())
    }

    /// Structured override holding only a filter
    pub fn filter(where_: RowData) -> Self {
        AssociationOverride::Structured {
            where_,
            sort: None,
            columns: None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AssociationOverride::None)
    }
}

impl From<&str> for AssociationOverride {
    fn from(fragment: &str) -> Self {
        AssociationOverride::Condition(fragment.to_string())
    }
}

impl From<String> for AssociationOverride {
    fn from(fragment: String) -> Self {
        AssociationOverride::Condition(fragment)
    }
}

/// Merge `overlay` into `base`. Nested objects merge key by key; on any other
/// collision the overlay value wins. Key order follows `base`, then new keys.
pub fn deep_merge(base: &RowData, overlay: &RowData) -> RowData {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let combined = match (merged.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                Value::Object(deep_merge(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}
