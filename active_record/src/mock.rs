//! In-memory executor for tests
//!
//! Records every statement and replays scripted responses in order. When the
//! script runs out, `fetch` returns no rows and `execute` reports zero
//! affected rows.

use crate::executor::{ExecutionStatus, ExecutorError, QueryExecutor, PG_UNDEFINED_TABLE};
use crate::RowData;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Fetch,
    Execute,
}

/// One statement seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub kind: QueryKind,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(Vec<RowData>),
    Status(ExecutionStatus),
    Error(ExecutorError),
}

#[derive(Debug)]
pub struct MockExecutor {
    log: Mutex<Vec<RecordedQuery>>,
    script: Mutex<VecDeque<MockResponse>>,
    returning: bool,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            returning: true,
        }
    }

    /// Behave like an engine without `RETURNING`
    pub fn without_returning(mut self) -> Self {
        self.returning = false;
        self
    }

    pub fn push(&self, response: MockResponse) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Queue a row set; entries that are not JSON objects are skipped
    pub fn push_rows(&self, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.push(MockResponse::Rows(rows));
    }

    pub fn push_status(&self, status: ExecutionStatus) {
        self.push(MockResponse::Status(status));
    }

    pub fn push_error(&self, error: ExecutorError) {
        self.push(MockResponse::Error(error));
    }

    /// Every statement seen so far, oldest first
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// SQL text of every statement seen so far
    pub fn statements(&self) -> Vec<String> {
        self.queries().into_iter().map(|q| q.sql).collect()
    }

    pub fn last_query(&self) -> Option<RecordedQuery> {
        self.queries().pop()
    }

    pub fn fetch_count(&self) -> usize {
        self.count(QueryKind::Fetch)
    }

    pub fn execute_count(&self) -> usize {
        self.count(QueryKind::Execute)
    }

    /// Forget recorded statements and any unconsumed responses
    pub fn reset(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn count(&self, kind: QueryKind) -> usize {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|q| q.kind == kind)
            .count()
    }

    fn record(&self, kind: QueryKind, sql: &str, params: &[Value]) -> Option<MockResponse> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedQuery {
                kind,
                sql: sql.to_string(),
                params: params.to_vec(),
            });
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl QueryExecutor for MockExecutor {
    fn fetch(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, ExecutorError> {
        match self.record(QueryKind::Fetch, sql, params) {
            Some(MockResponse::Rows(rows)) => Ok(rows),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Status(_)) | None => Ok(Vec::new()),
        }
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecutionStatus, ExecutorError> {
        match self.record(QueryKind::Execute, sql, params) {
            Some(MockResponse::Status(status)) => Ok(status),
            Some(MockResponse::Rows(rows)) => Ok(ExecutionStatus::affected(rows.len() as u64)),
            Some(MockResponse::Error(err)) => Err(err),
            None => Ok(ExecutionStatus::default()),
        }
    }

    fn missing_table_code(&self) -> &str {
        PG_UNDEFINED_TABLE
    }

    fn supports_returning(&self) -> bool {
        self.returning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replays_script_in_order() {
        let mock = MockExecutor::new();
        mock.push_rows(vec![json!({"id": 1}), json!("skipped")]);
        mock.push_status(ExecutionStatus::affected(3));

        let rows = mock.fetch("SELECT 1", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(mock.execute("DELETE FROM t", &[]).unwrap().rows_affected, 3);
        assert!(mock.fetch("SELECT 2", &[json!(2)]).unwrap().is_empty());

        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(mock.execute_count(), 1);
        assert_eq!(mock.last_query().unwrap().params, vec![json!(2)]);
    }

    #[test]
    fn test_errors_and_reset() {
        let mock = MockExecutor::new().without_returning();
        assert!(!mock.supports_returning());

        mock.push_error(ExecutorError::new("boom"));
        assert!(mock.execute("UPDATE t SET a = 1", &[]).is_err());

        mock.reset();
        assert!(mock.statements().is_empty());
    }
}
