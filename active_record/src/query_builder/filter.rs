//! Condition clauses, groups and bound parameters

use serde_json::Value;

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// One condition fragment with its positional parameters.
///
/// `operator` joins the clause to the clause before it inside the same group.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionClause {
    pub operator: LogicalOperator,
    pub fragment: String,
    pub params: Vec<Value>,
}

/// A closed, parenthesized run of clauses.
///
/// `operator` joins the group to the group before it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub operator: LogicalOperator,
    pub clauses: Vec<ConditionClause>,
}

/// Parameters handed to a `where_*` call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// Self-contained fragment such as `deleted_at IS NULL`
    #[default]
    None,
    One(Value),
    Many(Vec<Value>),
    /// Tuple rows for `(a, b) IN ((?, ?), ...)`
    Rows(Vec<Vec<Value>>),
}

impl Params {
    /// Flatten into the ordered bind list
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Params::None => Vec::new(),
            Params::One(value) => vec![value],
            Params::Many(values) => values,
            Params::Rows(rows) => rows.into_iter().flatten().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::None => 0,
            Params::One(_) => 1,
            Params::Many(values) => values.len(),
            Params::Rows(rows) => rows.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => {
                Params::Rows(
                    items
                        .into_iter()
                        .map(|row| match row {
                            Value::Array(values) => values,
                            other => vec![other],
                        })
                        .collect(),
                )
            }
            Value::Array(items) => Params::Many(items),
            other => Params::One(other),
        }
    }
}

impl From<&Value> for Params {
    fn from(value: &Value) -> Self {
        Params::from(value.clone())
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Many(values)
    }
}

impl From<Vec<Vec<Value>>> for Params {
    fn from(rows: Vec<Vec<Value>>) -> Self {
        Params::Rows(rows)
    }
}

impl From<Option<Value>> for Params {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(value) => Params::from(value),
            None => Params::One(Value::Null),
        }
    }
}

macro_rules! scalar_params {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Params {
                fn from(value: $ty) -> Self {
                    Params::One(Value::from(value))
                }
            }
        )*
    };
}

scalar_params!(&str, String, bool, i32, i64, u32, u64, f64);

/// Count `?` placeholders outside single-quoted literals
pub fn count_placeholders(fragment: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in fragment.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

/// `?, ?, ?`
pub fn placeholder_list(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `(?, ?), (?)`: one tuple per row, each with that row's arity
pub fn tuple_list(rows: &[Vec<Value>]) -> String {
    rows.iter()
        .map(|row| format!("({})", placeholder_list(row.len())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace the single unquoted `?` in `fragment` with `replacement`
pub fn replace_placeholder(fragment: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + replacement.len());
    let mut in_literal = false;
    for c in fragment.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => out.push_str(replacement),
            _ => out.push(c),
        }
    }
    out
}
