//! Fluent condition builder
//!
//! Clauses accumulate in an open group until [`ConditionBuilder::close_group`]
//! seals them into a parenthesized unit. Rendering never produces a statement
//! whose placeholder count differs from its parameter count: a clause whose
//! parameters cannot be matched to its fragment is recorded as an error and
//! surfaces from [`ConditionBuilder::build_where`].

use crate::errors::{ActiveRecordError, Result};
use crate::query_builder::filter::{
    count_placeholders, placeholder_list, replace_placeholder, tuple_list, ConditionClause,
    ConditionGroup, LogicalOperator, Params,
};
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::ordering::{order_clause, OrderTerm};
use crate::query_builder::pagination::Pagination;
use serde_json::Value;

/// Default primary-key column for [`where_pk`](crate::traits::Filterable::where_pk)
pub const DEFAULT_PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone)]
pub struct ConditionBuilder {
    groups: Vec<ConditionGroup>,
    open: Vec<ConditionClause>,
    pending: LogicalOperator,
    rejected: Vec<String>,
    select: Vec<String>,
    order_by: Vec<OrderTerm>,
    group_by: GroupBy,
    pagination: Pagination,
    primary_key: String,
}

impl Default for ConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionBuilder {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            open: Vec::new(),
            pending: LogicalOperator::And,
            rejected: Vec::new(),
            select: Vec::new(),
            order_by: Vec::new(),
            group_by: GroupBy::default(),
            pagination: Pagination::new(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
        }
    }

    /// Builder whose `where_pk` targets `primary_key`
    pub fn with_primary_key(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            ..Self::new()
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Expand `fragment` against `params` and append it to the open group
    pub fn push_clause(&mut self, fragment: &str, params: Params) {
        match expand(fragment, params) {
            Ok((fragment, params)) => self.push_expanded(fragment, params),
            Err(reason) => {
                crate::debug_log!("Rejected condition '{}': {}", fragment, reason);
                self.rejected.push(reason);
                self.pending = LogicalOperator::And;
            }
        }
    }

    /// Negated form of [`push_clause`](Self::push_clause): `!=`, `NOT IN`,
    /// `IS NOT NULL`; an empty list matches every row
    pub fn push_negated(&mut self, fragment: &str, params: Params) {
        let negated = if count_placeholders(fragment) > 0 || matches!(params, Params::None) {
            expand(fragment, params).map(|(sql, values)| (format!("NOT ({})", sql), values))
        } else {
            Ok(match params {
                Params::One(Value::Null) => (format!("{} IS NOT NULL", fragment), Vec::new()),
                Params::One(value) => (format!("{} != ?", fragment), vec![value]),
                Params::Many(values) if values.is_empty() => ("1=1".to_string(), Vec::new()),
                Params::Many(values) => (
                    format!("{} NOT IN ({})", fragment, placeholder_list(values.len())),
                    values,
                ),
                Params::Rows(rows) if rows.is_empty() => ("1=1".to_string(), Vec::new()),
                Params::Rows(rows) => {
                    let sql = format!("{} NOT IN ({})", fragment, tuple_list(&rows));
                    (sql, Params::Rows(rows).into_values())
                }
                Params::None => (format!("NOT ({})", fragment), Vec::new()),
            })
        };

        match negated {
            Ok((fragment, params)) => self.push_expanded(fragment, params),
            Err(reason) => {
                self.rejected.push(reason);
                self.pending = LogicalOperator::And;
            }
        }
    }

    /// Append an already expanded fragment; `params` must match its placeholders
    pub fn push_expanded(&mut self, fragment: String, params: Vec<Value>) {
        let operator = std::mem::take(&mut self.pending);
        self.open.push(ConditionClause {
            operator,
            fragment,
            params,
        });
    }

    /// Operator used for the next appended clause
    pub fn set_operator(&mut self, operator: LogicalOperator) {
        self.pending = operator;
    }

    /// Seal the open group; does nothing when it holds no clause
    pub fn close_group(&mut self) {
        if self.open.is_empty() {
            return;
        }
        let clauses = std::mem::take(&mut self.open);
        let operator = clauses[0].operator;
        self.groups.push(ConditionGroup { operator, clauses });
    }

    pub fn add_select(&mut self, columns: &str) {
        self.select.push(columns.to_string());
    }

    pub fn add_order(&mut self, term: OrderTerm) {
        self.order_by.push(term);
    }

    pub fn add_group_by(&mut self, column: &str) {
        self.group_by.push(column);
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.pagination.limit = Some(limit);
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.pagination.offset = Some(offset);
    }

    /// Whether any condition (accepted or rejected) was added
    pub fn has_conditions(&self) -> bool {
        !self.groups.is_empty() || !self.open.is_empty() || !self.rejected.is_empty()
    }

    /// Drop every condition, keeping the query options
    pub fn clear_conditions(&mut self) {
        self.groups.clear();
        self.open.clear();
        self.rejected.clear();
        self.pending = LogicalOperator::And;
    }

    /// Render the condition tree (without the `WHERE` keyword) and its parameters
    pub fn build_where(&self) -> Result<(String, Vec<Value>)> {
        if let Some(reason) = self.rejected.first() {
            return Err(ActiveRecordError::QueryBuild(reason.clone()));
        }

        let mut sql = String::new();
        let mut params = Vec::new();

        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                sql.push_str(&format!(" {} ", group.operator.to_sql()));
            }
            sql.push('(');
            render_clauses(&group.clauses, &mut sql, &mut params);
            sql.push(')');
        }

        if let Some(first) = self.open.first() {
            if self.groups.is_empty() {
                render_clauses(&self.open, &mut sql, &mut params);
            } else {
                sql.push_str(&format!(" {} (", first.operator.to_sql()));
                render_clauses(&self.open, &mut sql, &mut params);
                sql.push(')');
            }
        }

        crate::trace_log!("Rendered conditions: {} with {} params", sql, params.len());
        Ok((sql, params))
    }

    /// Column list for SELECT, `*` when none was requested
    pub fn select_sql(&self) -> String {
        if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(", ")
        }
    }

    pub fn order_sql(&self) -> String {
        order_clause(&self.order_by)
    }

    pub fn group_sql(&self) -> String {
        self.group_by.to_sql()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }
}

fn render_clauses(clauses: &[ConditionClause], sql: &mut String, params: &mut Vec<Value>) {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            sql.push_str(&format!(" {} ", clause.operator.to_sql()));
        }
        sql.push_str(&clause.fragment);
        params.extend(clause.params.iter().cloned());
    }
}

/// Match a fragment's placeholders to the supplied parameters
pub(crate) fn expand(
    fragment: &str,
    params: Params,
) -> std::result::Result<(String, Vec<Value>), String> {
    let placeholders = count_placeholders(fragment);

    if placeholders == 0 {
        return Ok(match params {
            Params::None => (fragment.to_string(), Vec::new()),
            Params::One(Value::Null) => (format!("{} IS NULL", fragment), Vec::new()),
            Params::One(value) => (format!("{} = ?", fragment), vec![value]),
            Params::Many(values) if values.is_empty() => ("1=0".to_string(), Vec::new()),
            Params::Many(values) => (
                format!("{} IN ({})", fragment, placeholder_list(values.len())),
                values,
            ),
            Params::Rows(rows) if rows.is_empty() => ("1=0".to_string(), Vec::new()),
            Params::Rows(rows) => {
                let sql = format!("{} IN ({})", fragment, tuple_list(&rows));
                (sql, Params::Rows(rows).into_values())
            }
        });
    }

    // A list bound to a lone `?` is always a parenthesized list, whatever its length
    let params = match params {
        Params::Many(values) if placeholders == 1 && !values.is_empty() => {
            let list = format!("({})", placeholder_list(values.len()));
            return Ok((replace_placeholder(fragment, &list), values));
        }
        Params::Rows(rows) if placeholders == 1 && !rows.is_empty() => {
            let list = format!("({})", tuple_list(&rows));
            return Ok((
                replace_placeholder(fragment, &list),
                Params::Rows(rows).into_values(),
            ));
        }
        other => other,
    };

    if placeholders == params.len() {
        return Ok((fragment.to_string(), params.into_values()));
    }

    Err(format!(
        "'{}' has {} placeholder(s) but {} parameter(s) were given",
        fragment,
        placeholders,
        params.len()
    ))
}
