//! ORDER BY terms

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One entry of an ORDER BY list
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTerm {
    Column(String, SortOrder),
    /// Expression used as given, e.g. `created_at DESC NULLS LAST`
    Raw(String),
}

impl OrderTerm {
    pub fn to_sql(&self) -> String {
        match self {
            OrderTerm::Column(column, order) => format!("{} {}", column, order.to_sql()),
            OrderTerm::Raw(expr) => expr.clone(),
        }
    }
}

/// Render `ORDER BY ...`, or an empty string for no terms
pub fn order_clause(terms: &[OrderTerm]) -> String {
    if terms.is_empty() {
        return String::new();
    }
    format!(
        "ORDER BY {}",
        terms
            .iter()
            .map(OrderTerm::to_sql)
            .collect::<Vec<_>>()
            .join(", ")
    )
}
