//! Query execution boundary
//!
//! The record layer renders SQL with `?` placeholders plus an ordered
//! parameter list and hands both to a [`QueryExecutor`]. Executors are
//! synchronous: every call returns only once the statement has finished.

use crate::RowData;
use serde_json::Value;
use thiserror::Error;

/// SQLSTATE PostgreSQL reports for `undefined_table`
pub const PG_UNDEFINED_TABLE: &str = "42P01";

/// Failure reported by an executor
#[derive(Debug, Clone, Error)]
#[error("{message}{}", code_suffix(.code))]
pub struct ExecutorError {
    /// Engine-defined error code (SQLSTATE for PostgreSQL)
    pub code: Option<String>,
    pub message: String,
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" [{}]", c)).unwrap_or_default()
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

/// Outcome of a statement that does not return rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStatus {
    pub rows_affected: u64,
    /// Generated key of the last inserted row, for engines without RETURNING
    pub last_insert_id: Option<Value>,
}

impl ExecutionStatus {
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn inserted(last_insert_id: Value) -> Self {
        Self {
            rows_affected: 1,
            last_insert_id: Some(last_insert_id),
        }
    }
}

/// Raw SQL execution collaborator.
///
/// Placeholders are `?`; implementations translate them to the driver's style.
pub trait QueryExecutor: Send + Sync {
    /// Run a statement returning raw tabular rows
    fn fetch(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, ExecutorError>;

    /// Run a statement returning an execution status
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecutionStatus, ExecutorError>;

    /// Error code signalling that the addressed table does not exist
    fn missing_table_code(&self) -> &str {
        PG_UNDEFINED_TABLE
    }

    /// Whether `INSERT ... RETURNING *` is understood
    fn supports_returning(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code() {
        let err = ExecutorError::with_code("42P01", "relation \"users\" does not exist");
        assert_eq!(err.to_string(), "relation \"users\" does not exist [42P01]");
        assert!(err.has_code(PG_UNDEFINED_TABLE));

        let err = ExecutorError::new("connection reset");
        assert_eq!(err.to_string(), "connection reset");
        assert!(!err.has_code(PG_UNDEFINED_TABLE));
    }
}
