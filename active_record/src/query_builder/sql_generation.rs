//! Statement rendering
//!
//! All statements use `?` placeholders; NULL column values are written as the
//! `NULL` literal so they never need a typed bind.

use crate::errors::Result;
use crate::query_builder::builder::ConditionBuilder;
use crate::RowData;
use serde_json::Value;

pub struct SqlGenerator;

impl SqlGenerator {
    /// `SELECT <cols> FROM <table> [WHERE] [GROUP BY] [ORDER BY] [LIMIT/OFFSET]`
    pub fn select(table: &str, builder: &ConditionBuilder) -> Result<(String, Vec<Value>)> {
        let (where_sql, params) = builder.build_where()?;
        let mut sql = format!("SELECT {} FROM {}", builder.select_sql(), table);
        Self::push_where(&mut sql, &where_sql);

        for clause in [
            builder.group_sql(),
            builder.order_sql(),
            builder.pagination().to_sql(),
        ] {
            if !clause.is_empty() {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }

        Ok((sql, params))
    }

    /// `SELECT COUNT(*) AS count FROM <table> [WHERE]`
    pub fn count(table: &str, builder: &ConditionBuilder) -> Result<(String, Vec<Value>)> {
        let (where_sql, params) = builder.build_where()?;
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", table);
        Self::push_where(&mut sql, &where_sql);
        Ok((sql, params))
    }

    /// Single-row INSERT, optionally returning the stored row
    pub fn insert(table: &str, row: &RowData, returning: bool) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let sql = if row.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let values = row
                .values()
                .map(|value| Self::value_sql(value, &mut params))
                .collect::<Vec<_>>();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                row.keys().cloned().collect::<Vec<_>>().join(", "),
                values.join(", ")
            )
        };

        if returning {
            (format!("{} RETURNING *", sql), params)
        } else {
            (sql, params)
        }
    }

    /// Multi-row INSERT; columns absent from a row render as `DEFAULT`
    pub fn insert_many(table: &str, rows: &[RowData]) -> (String, Vec<Value>) {
        let mut columns: Vec<&String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
        }

        let mut params = Vec::new();
        let tuples = rows
            .iter()
            .map(|row| {
                let values = columns
                    .iter()
                    .map(|column| match row.get(*column) {
                        Some(value) => Self::value_sql(value, &mut params),
                        None => "DEFAULT".to_string(),
                    })
                    .collect::<Vec<_>>();
                format!("({})", values.join(", "))
            })
            .collect::<Vec<_>>();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            columns
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            tuples.join(", ")
        );
        (sql, params)
    }

    /// `UPDATE <table> SET ... [WHERE]`; SET parameters precede WHERE parameters
    pub fn update(
        table: &str,
        payload: &RowData,
        where_sql: &str,
        where_params: Vec<Value>,
    ) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let assignments = payload
            .iter()
            .map(|(column, value)| format!("{} = {}", column, Self::value_sql(value, &mut params)))
            .collect::<Vec<_>>();

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        Self::push_where(&mut sql, where_sql);
        params.extend(where_params);
        (sql, params)
    }

    /// `DELETE FROM <table> [WHERE]`
    pub fn delete(table: &str, where_sql: &str) -> String {
        let mut sql = format!("DELETE FROM {}", table);
        Self::push_where(&mut sql, where_sql);
        sql
    }

    fn push_where(sql: &mut String, where_sql: &str) {
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(where_sql);
        }
    }

    fn value_sql(value: &Value, params: &mut Vec<Value>) -> String {
        if value.is_null() {
            "NULL".to_string()
        } else {
            params.push(value.clone());
            "?".to_string()
        }
    }
}
