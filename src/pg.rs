//! PostgreSQL executor
//!
//! A blocking facade over a sqlx pool: every call drives the query to
//! completion on the shared tokio runtime before returning. Calls must not
//! be made from inside that runtime's async context.

use active_record::{ExecutionStatus, ExecutorError, QueryExecutor, RowData};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo};
use std::sync::Arc;
use tokio::runtime::Runtime;
use type_mapping::{decode_kind_for_pg_type, numbered_placeholders, to_bind_value, BindValue, DecodeKind};

pub struct PgExecutor {
    pool: PgPool,
    runtime: Arc<Runtime>,
}

impl PgExecutor {
    pub fn new(pool: PgPool, runtime: Arc<Runtime>) -> Self {
        Self { pool, runtime }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn query<'q>(sql: &'q str, params: &[Value]) -> Query<'q, Postgres, PgArguments> {
        params
            .iter()
            .fold(sqlx::query(sql), |query, param| bind_param(query, param))
    }
}

impl QueryExecutor for PgExecutor {
    fn fetch(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, ExecutorError> {
        let sql = numbered_placeholders(sql);
        let rows = self
            .runtime
            .block_on(Self::query(&sql, params).fetch_all(&self.pool))
            .map_err(executor_error)?;
        Ok(rows.iter().map(decode_row).collect())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecutionStatus, ExecutorError> {
        let sql = numbered_placeholders(sql);
        let result = self
            .runtime
            .block_on(Self::query(&sql, params).execute(&self.pool))
            .map_err(executor_error)?;
        Ok(ExecutionStatus::affected(result.rows_affected()))
    }
}

/// Carry the SQLSTATE along so missing tables can be recognised
pub fn executor_error(err: sqlx::Error) -> ExecutorError {
    let code = match &err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    };
    match code {
        Some(code) => ExecutorError::with_code(code, err.to_string()),
        None => ExecutorError::new(err.to_string()),
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match to_bind_value(param) {
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Boolean(b) => query.bind(b),
        BindValue::BigInt(i) => match i32::try_from(i) {
            Ok(small) => query.bind(small),
            Err(_) => query.bind(i),
        },
        BindValue::Double(f) => query.bind(f),
        BindValue::Timestamp(dt) => query.bind(dt),
        BindValue::Text(s) => match uuid::Uuid::parse_str(&s) {
            Ok(uuid) => query.bind(uuid),
            Err(_) => query.bind(s),
        },
        BindValue::Json(value) => query.bind(sqlx::types::Json(value)),
    }
}

fn decode_row(row: &PgRow) -> RowData {
    row.columns()
        .iter()
        .map(|column| {
            let kind = decode_kind_for_pg_type(column.type_info().name());
            (column.name().to_string(), decode_column(row, column.ordinal(), kind))
        })
        .collect()
}

fn decode_column(row: &PgRow, index: usize, kind: DecodeKind) -> Value {
    fn get<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        row.try_get::<Option<T>, _>(index).ok().flatten()
    }

    let value = match kind {
        DecodeKind::SmallInt => get::<i16>(row, index).map(Value::from),
        DecodeKind::Integer => get::<i32>(row, index).map(Value::from),
        DecodeKind::BigInt => get::<i64>(row, index).map(Value::from),
        DecodeKind::Real => get::<f32>(row, index).map(|f| Value::from(f as f64)),
        DecodeKind::Double => get::<f64>(row, index).map(Value::from),
        DecodeKind::Boolean => get::<bool>(row, index).map(Value::from),
        DecodeKind::Text | DecodeKind::Other => get::<String>(row, index).map(Value::from),
        DecodeKind::TimestampTz => {
            get::<DateTime<Utc>>(row, index).map(|dt| Value::from(dt.to_rfc3339()))
        }
        DecodeKind::Timestamp => get::<NaiveDateTime>(row, index)
            .map(|dt| Value::from(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        DecodeKind::Date => get::<NaiveDate>(row, index).map(|d| Value::from(d.to_string())),
        DecodeKind::Uuid => get::<uuid::Uuid>(row, index).map(|u| Value::from(u.to_string())),
        DecodeKind::Json => get::<Value>(row, index),
    };
    value.unwrap_or(Value::Null)
}
