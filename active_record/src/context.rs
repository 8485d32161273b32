//! Execution context shared by model instances
//!
//! A context bundles the executor for one connection alias, the class
//! registry, the clock used for timestamp stamping, and the auto-create
//! switch. Every statement the record layer issues goes through
//! [`ModelContext::fetch`] or [`ModelContext::execute`], which implement the
//! single create-then-retry path for missing tables.

use crate::association::AssociationRegistry;
use crate::errors::{ActiveRecordError, Result};
use crate::executor::{ExecutionStatus, ExecutorError, QueryExecutor};
use crate::record::ActiveRecord;
use crate::table_metadata::TableMetadata;
use crate::traits::Model;
use crate::RowData;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct ModelContext {
    executor: Arc<dyn QueryExecutor>,
    registry: Arc<AssociationRegistry>,
    clock: Clock,
    auto_create_tables: bool,
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("registry", &self.registry)
            .field("auto_create_tables", &self.auto_create_tables)
            .finish()
    }
}

impl ModelContext {
    /// Context with its own registry, the system clock and auto-create enabled
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            registry: Arc::new(AssociationRegistry::new()),
            clock: Arc::new(Utc::now),
            auto_create_tables: true,
        }
    }

    /// Share a registry between contexts (one per process is typical)
    pub fn with_registry(mut self, registry: Arc<AssociationRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_auto_create_tables(mut self, enabled: bool) -> Self {
        self.auto_create_tables = enabled;
        self
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub fn registry(&self) -> &Arc<AssociationRegistry> {
        &self.registry
    }

    pub fn auto_create_tables(&self) -> bool {
        self.auto_create_tables
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Fresh instance of `M`; builds the class metadata on first use
    pub fn model<M: Model>(&self) -> Result<ActiveRecord> {
        let class = self.registry.class::<M>()?;
        Ok(ActiveRecord::new(class, self.clone()))
    }

    /// Run `CREATE TABLE IF NOT EXISTS` for `M`'s declared schema.
    ///
    /// Returns `false` when `M` declares no schema.
    pub fn create_table<M: Model>(&self) -> Result<bool> {
        let class = self.registry.class::<M>()?;
        let table = class.table();
        match table.create_table_sql() {
            Some(ddl) => {
                self.executor
                    .execute(&ddl, &[])
                    .map_err(|e| ActiveRecordError::query_execution(&table.name, &ddl, e))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run a row-returning statement against `table`
    pub fn fetch(&self, table: &TableMetadata, sql: &str, params: &[Value]) -> Result<Vec<RowData>> {
        crate::trace_log!("fetch on {}: {} {:?}", table.name, sql, params);
        self.with_missing_table_retry(table, sql, || self.executor.fetch(sql, params))
    }

    /// Run a statement returning an execution status against `table`
    pub fn execute(
        &self,
        table: &TableMetadata,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecutionStatus> {
        crate::trace_log!("execute on {}: {} {:?}", table.name, sql, params);
        self.with_missing_table_retry(table, sql, || self.executor.execute(sql, params))
    }

    fn with_missing_table_retry<T>(
        &self,
        table: &TableMetadata,
        sql: &str,
        run: impl Fn() -> std::result::Result<T, ExecutorError>,
    ) -> Result<T> {
        let err = match run() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.has_code(self.executor.missing_table_code()) {
            return Err(ActiveRecordError::query_execution(&table.name, sql, err));
        }

        let ddl = match table.create_table_sql() {
            Some(ddl) if self.auto_create_tables => ddl,
            _ => {
                return Err(ActiveRecordError::MissingTable {
                    table: table.name.clone(),
                    source: err,
                })
            }
        };

        warn!(
            table = %table.name,
            "Table does not exist; creating it from the declared schema and retrying once"
        );
        self.executor
            .execute(&ddl, &[])
            .map_err(|e| ActiveRecordError::query_execution(&table.name, &ddl, e))?;

        run().map_err(|e| ActiveRecordError::query_execution(&table.name, sql, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::PG_UNDEFINED_TABLE;
    use crate::mock::MockExecutor;
    use serde_json::json;
    use type_mapping::FieldSpec;

    fn users_with_schema() -> TableMetadata {
        TableMetadata::new("users", "id")
            .column("id", FieldSpec::big_integer().auto_increment())
            .column("name", FieldSpec::text())
    }

    fn missing() -> ExecutorError {
        ExecutorError::with_code(PG_UNDEFINED_TABLE, "relation \"users\" does not exist")
    }

    #[test]
    fn test_missing_table_is_created_and_retried_once() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(missing());
        mock.push_status(ExecutionStatus::affected(0));
        mock.push_rows(vec![json!({"id": 1})]);
        let ctx = ModelContext::new(mock.clone());

        let rows = ctx
            .fetch(&users_with_schema(), "SELECT * FROM users", &[])
            .unwrap();

        assert_eq!(rows.len(), 1);
        let sql = mock.statements();
        assert_eq!(sql.len(), 3);
        assert_eq!(sql[0], "SELECT * FROM users");
        assert!(sql[1].starts_with("CREATE TABLE IF NOT EXISTS users"));
        assert_eq!(sql[2], "SELECT * FROM users");
    }

    #[test]
    fn test_failing_retry_propagates() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(missing());
        mock.push_status(ExecutionStatus::affected(0));
        mock.push_error(missing());
        let ctx = ModelContext::new(mock.clone());

        let err = ctx
            .fetch(&users_with_schema(), "SELECT * FROM users", &[])
            .unwrap_err();

        match err {
            ActiveRecordError::QueryExecution { source, .. } => {
                assert!(source.has_code(PG_UNDEFINED_TABLE))
            }
            other => panic!("Expected QueryExecution error, got {:?}", other),
        }
        assert_eq!(mock.statements().len(), 3);
    }

    #[test]
    fn test_no_schema_means_no_create() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(missing());
        let ctx = ModelContext::new(mock.clone());

        let err = ctx
            .fetch(&TableMetadata::new("users", "id"), "SELECT * FROM users", &[])
            .unwrap_err();

        assert!(matches!(err, ActiveRecordError::MissingTable { .. }));
        assert_eq!(mock.statements().len(), 1);
    }

    #[test]
    fn test_auto_create_disabled() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(missing());
        let ctx = ModelContext::new(mock.clone()).with_auto_create_tables(false);

        let err = ctx
            .execute(&users_with_schema(), "DELETE FROM users", &[])
            .unwrap_err();

        assert!(matches!(err, ActiveRecordError::MissingTable { .. }));
        assert_eq!(mock.statements().len(), 1);
    }

    #[test]
    fn test_other_codes_never_create() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(ExecutorError::with_code("23505", "duplicate key"));
        let ctx = ModelContext::new(mock.clone());

        let err = ctx
            .execute(&users_with_schema(), "INSERT INTO users (name) VALUES (?)", &[json!("a")])
            .unwrap_err();

        assert!(err.is_database_error());
        assert!(matches!(err, ActiveRecordError::QueryExecution { .. }));
        assert_eq!(mock.statements().len(), 1);
    }

    #[test]
    fn test_fixed_clock() {
        let instant = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let ctx = ModelContext::new(Arc::new(MockExecutor::new())).with_clock(move || instant);
        assert_eq!(ctx.now(), instant);
    }
}
