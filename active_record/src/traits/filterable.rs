use crate::query_builder::{ConditionBuilder, LogicalOperator, OrderTerm, Params, SortOrder};
use serde_json::Value;

/// Chainable condition and query-option methods.
///
/// Implementors only expose their [`ConditionBuilder`]; every method consumes
/// and returns `self` so calls read left to right:
///
/// ```
/// use active_record::prelude::*;
/// use serde_json::json;
///
/// let builder = ConditionBuilder::new()
///     .where_("a", 1)
///     .where_("b", 2)
///     .wrap()
///     .or()
///     .where_("c", 3)
///     .where_("d", 4)
///     .wrap();
///
/// let (sql, params) = builder.build_where().unwrap();
/// assert_eq!(sql, "(a = ? AND b = ?) OR (c = ? AND d = ?)");
/// assert_eq!(params, vec![json!(1), json!(2), json!(3), json!(4)]);
/// ```
pub trait Filterable: Sized {
    fn conditions_mut(&mut self) -> &mut ConditionBuilder;

    /// Append a condition; see [`Params`] for the accepted shapes
    fn where_(mut self, fragment: &str, params: impl Into<Params>) -> Self {
        self.conditions_mut().push_clause(fragment, params.into());
        self
    }

    fn where_not(mut self, fragment: &str, params: impl Into<Params>) -> Self {
        self.conditions_mut().push_negated(fragment, params.into());
        self
    }

    fn where_like(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.conditions_mut()
            .push_expanded(format!("{} LIKE ?", column), vec![Value::String(pattern.into())]);
        self
    }

    fn where_not_like(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.conditions_mut().push_expanded(
            format!("{} NOT LIKE ?", column),
            vec![Value::String(pattern.into())],
        );
        self
    }

    fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, ">", value.into())
    }

    fn where_gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, ">=", value.into())
    }

    fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, "<", value.into())
    }

    fn where_lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, "<=", value.into())
    }

    #[doc(hidden)]
    fn compare(mut self, column: &str, operator: &str, value: Value) -> Self {
        self.conditions_mut()
            .push_expanded(format!("{} {} ?", column, operator), vec![value]);
        self
    }

    /// `column IN (...)`; an empty list matches nothing
    fn where_in(mut self, column: &str, values: impl Into<Params>) -> Self {
        let params = match values.into() {
            Params::One(value) => Params::Many(vec![value]),
            other => other,
        };
        self.conditions_mut().push_clause(column, params);
        self
    }

    /// `column NOT IN (...)`; an empty list matches everything
    fn where_not_in(mut self, column: &str, values: impl Into<Params>) -> Self {
        let params = match values.into() {
            Params::One(value) => Params::Many(vec![value]),
            other => other,
        };
        self.conditions_mut().push_negated(column, params);
        self
    }

    fn where_null(mut self, column: &str) -> Self {
        self.conditions_mut()
            .push_expanded(format!("{} IS NULL", column), Vec::new());
        self
    }

    fn where_not_null(mut self, column: &str) -> Self {
        self.conditions_mut()
            .push_expanded(format!("{} IS NOT NULL", column), Vec::new());
        self
    }

    /// Match the builder's primary-key column
    fn where_pk(mut self, value: impl Into<Params>) -> Self {
        let builder = self.conditions_mut();
        let column = builder.primary_key().to_string();
        builder.push_clause(&column, value.into());
        self
    }

    /// Join the next clause with AND (the default)
    fn and(mut self) -> Self {
        self.conditions_mut().set_operator(LogicalOperator::And);
        self
    }

    /// Join the next clause with OR
    fn or(mut self) -> Self {
        self.conditions_mut().set_operator(LogicalOperator::Or);
        self
    }

    /// Close the clauses added since the last wrap into one parenthesized group
    fn wrap(mut self) -> Self {
        self.conditions_mut().close_group();
        self
    }

    fn select(mut self, columns: &str) -> Self {
        self.conditions_mut().add_select(columns);
        self
    }

    fn order_by(mut self, column: &str, order: SortOrder) -> Self {
        self.conditions_mut()
            .add_order(OrderTerm::Column(column.to_string(), order));
        self
    }

    fn order_by_raw(mut self, expr: &str) -> Self {
        self.conditions_mut().add_order(OrderTerm::Raw(expr.to_string()));
        self
    }

    fn group_by(mut self, column: &str) -> Self {
        self.conditions_mut().add_group_by(column);
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.conditions_mut().set_limit(limit);
        self
    }

    fn offset(mut self, offset: u64) -> Self {
        self.conditions_mut().set_offset(offset);
        self
    }
}

impl Filterable for ConditionBuilder {
    fn conditions_mut(&mut self) -> &mut ConditionBuilder {
        self
    }
}
