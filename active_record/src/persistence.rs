//! Reads and writes for [`ActiveRecord`]

use crate::errors::{ActiveRecordError, Result};
use crate::query_builder::{ConditionBuilder, SqlGenerator};
use crate::record::{ActiveRecord, ResultSet};
use crate::traits::Filterable;
use crate::RowData;
use serde_json::Value;
use tracing::warn;

/// Payload for [`ActiveRecord::insert`]
#[derive(Debug, Clone, PartialEq)]
pub enum InsertData {
    One(RowData),
    Many(Vec<RowData>),
}

impl From<RowData> for InsertData {
    fn from(row: RowData) -> Self {
        InsertData::One(row)
    }
}

impl From<Vec<RowData>> for InsertData {
    fn from(rows: Vec<RowData>) -> Self {
        InsertData::Many(rows)
    }
}

/// Result of [`ActiveRecord::insert`]
#[derive(Debug, Clone)]
pub enum Inserted {
    /// The stored row, primary key populated
    Record(Box<ActiveRecord>),
    /// Number of rows written by a multi-row insert
    Count(u64),
}

impl Inserted {
    pub fn into_record(self) -> Option<ActiveRecord> {
        match self {
            Inserted::Record(record) => Some(*record),
            Inserted::Count(_) => None,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            Inserted::Record(_) => 1,
            Inserted::Count(count) => *count,
        }
    }
}

impl ActiveRecord {
    /// Insert one row (returning it hydrated) or many rows in one statement
    /// (returning the count)
    pub fn insert(&self, data: impl Into<InsertData>) -> Result<Inserted> {
        match data.into() {
            InsertData::One(row) => self.insert_one(row).map(|r| Inserted::Record(Box::new(r))),
            InsertData::Many(rows) => self.insert_many(rows).map(Inserted::Count),
        }
    }

    fn prepare_insert(&self, mut row: RowData) -> Result<RowData> {
        let stamped = self.table().timestamps.on_insert.clone();
        if !stamped.is_empty() {
            let now = Value::String(self.ctx.now().to_rfc3339());
            for column in stamped {
                row.insert(column, now.clone());
            }
        }
        Ok(self.hooks.apply_insert(row)?)
    }

    fn insert_one(&self, row: RowData) -> Result<ActiveRecord> {
        let row = self.prepare_insert(row)?;
        let table = self.table();
        let returning = self.ctx.executor().supports_returning();
        let (sql, params) = SqlGenerator::insert(&table.name, &row, returning);

        let stored = if returning {
            self.ctx
                .fetch(table, &sql, &params)?
                .into_iter()
                .next()
                .unwrap_or(row)
        } else {
            let status = self.ctx.execute(table, &sql, &params)?;
            let mut row = row;
            if let Some(id) = status.last_insert_id {
                row.entry(table.primary_key.clone()).or_insert(id);
            }
            row
        };

        crate::debug_log!("Inserted row into {}", table.name);
        Ok(self.hydrate(stored))
    }

    fn insert_many(&self, rows: Vec<RowData>) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = rows
            .into_iter()
            .map(|row| self.prepare_insert(row))
            .collect::<Result<Vec<_>>>()?;

        let table = self.table();
        let (sql, params) = SqlGenerator::insert_many(&table.name, &rows);
        let status = self.ctx.execute(table, &sql, &params)?;

        crate::debug_log!("Inserted {} rows into {}", status.rows_affected, table.name);
        Ok(status.rows_affected)
    }

    /// Persist changes.
    ///
    /// The SET list is built from the update timestamps, then the dirty
    /// fields, then `data` (later sources win), and passed through the update
    /// hook. A single row with a primary key is updated by that key; anything
    /// else updates the rows matching the accumulated conditions.
    pub fn update(&mut self, data: Option<RowData>) -> Result<u64> {
        if !self.is_single_row && !self.conditions.has_conditions() {
            return Err(self.multi_row_error("update without conditions"));
        }

        let mut payload = RowData::new();

        let stamped = &self.table().timestamps.on_update;
        if !stamped.is_empty() {
            let now = Value::String(self.ctx.now().to_rfc3339());
            for column in stamped {
                payload.insert(column.clone(), now.clone());
            }
        }
        for key in &self.dirty {
            if let Some(value) = self.data.get(key) {
                payload.insert(key.clone(), value.clone());
            }
        }
        if let Some(data) = data {
            payload.extend(data);
        }

        let mut payload = self.hooks.apply_update(payload)?;

        let table = self.class.table();
        let pk_scope = match self.primary_key_value() {
            Some(pk) if self.is_single_row => Some(pk.clone()),
            _ => None,
        };

        let (where_sql, where_params) = match &pk_scope {
            Some(pk) => {
                payload.shift_remove(&table.primary_key);
                (format!("{} = ?", table.primary_key), vec![pk.clone()])
            }
            None => self.conditions.build_where()?,
        };

        if payload.is_empty() {
            crate::debug_log!("Nothing to update on {}", table.name);
            return Ok(0);
        }

        if where_sql.is_empty() {
            warn!(table = %table.name, "Updating every row: no primary key and no conditions");
        }

        let (sql, params) = SqlGenerator::update(&table.name, &payload, &where_sql, where_params);
        let status = self.ctx.execute(table, &sql, &params)?;

        if pk_scope.is_some() {
            for (key, value) in payload {
                self.data.insert(key, value);
            }
        }
        self.dirty.clear();

        Ok(status.rows_affected)
    }

    /// Insert when there is no primary-key value, update otherwise
    pub fn save(&mut self) -> Result<u64> {
        if !self.is_single_row {
            return Err(self.multi_row_error("save"));
        }
        if self.primary_key_value().is_some() {
            return self.update(None);
        }

        let stored = self.insert_one(self.data.clone())?;
        self.data = stored.data;
        self.rows.clear();
        self.is_single_row = true;
        self.dirty.clear();
        self.eager_cache.clear();
        Ok(1)
    }

    /// Delete by primary key, else by the accumulated conditions, else every
    /// row when `delete_all` is set. The delete hook runs first and can veto.
    pub fn delete(&mut self, delete_all: bool) -> Result<u64> {
        let table = self.class.table();

        let (where_sql, params) = match self.primary_key_value() {
            Some(pk) if self.is_single_row => {
                (format!("{} = ?", table.primary_key), vec![pk.clone()])
            }
            _ if self.conditions.has_conditions() => self.conditions.build_where()?,
            _ if delete_all => (String::new(), Vec::new()),
            _ => {
                return Err(ActiveRecordError::UnguardedDelete {
                    table: table.name.clone(),
                })
            }
        };

        self.hooks.run_delete()?;

        let sql = SqlGenerator::delete(&table.name, &where_sql);
        let status = self.ctx.execute(table, &sql, &params)?;
        crate::debug_log!("Deleted {} rows from {}", status.rows_affected, table.name);
        Ok(status.rows_affected)
    }

    /// Rows matching the accumulated conditions and options
    pub fn find(&self) -> Result<ResultSet> {
        self.select_with(&self.conditions)
    }

    /// First row matching the accumulated conditions
    pub fn find_one(&self) -> Result<Option<ActiveRecord>> {
        let builder = self.conditions.clone().limit(1);
        Ok(self.select_with(&builder)?.into_iter().next())
    }

    pub fn find_by_pk(&self, value: impl Into<Value>) -> Result<Option<ActiveRecord>> {
        let builder = ConditionBuilder::with_primary_key(self.table().primary_key.clone())
            .where_pk(value.into())
            .limit(1);
        Ok(self.select_with(&builder)?.into_iter().next())
    }

    /// Number of rows matching the accumulated conditions
    pub fn count(&self) -> Result<u64> {
        let table = self.table();
        let (sql, params) = SqlGenerator::count(&table.name, &self.conditions)?;
        let rows = self.ctx.fetch(table, &sql, &params)?;

        let value = rows
            .first()
            .and_then(|row| row.get("count").or_else(|| row.values().next()));
        Ok(match value {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        })
    }

    fn multi_row_error(&self, operation: &str) -> ActiveRecordError {
        ActiveRecordError::ViewModel(format!(
            "{} needs a single-row '{}' record, this one holds {} rows",
            operation,
            self.table().name,
            self.rows.len()
        ))
    }

    pub(crate) fn select_with(&self, builder: &ConditionBuilder) -> Result<ResultSet> {
        let table = self.table();
        let (sql, params) = SqlGenerator::select(&table.name, builder)?;
        let rows = self.ctx.fetch(table, &sql, &params)?;
        Ok(ResultSet::from(
            rows.into_iter()
                .map(|row| self.hydrate(row))
                .collect::<Vec<_>>(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModelContext;
    use crate::executor::ExecutionStatus;
    use crate::mock::MockExecutor;
    use crate::table_metadata::TableMetadata;
    use crate::traits::Model;
    use chrono::{DateTime, Utc};
    use hook_system::HookSet;
    use serde_json::json;
    use std::sync::Arc;

    const NOW: &str = "2024-05-06T07:08:09+00:00";

    struct Task;

    impl Model for Task {
        fn table() -> TableMetadata {
            TableMetadata::new("tasks", "id")
                .stamp_on_insert("created_at")
                .stamp_on_update("updated_at")
        }
    }

    fn setup() -> (Arc<MockExecutor>, ModelContext) {
        let mock = Arc::new(MockExecutor::new());
        let now = DateTime::parse_from_rfc3339(NOW).unwrap().with_timezone(&Utc);
        let ctx = ModelContext::new(mock.clone()).with_clock(move || now);
        (mock, ctx)
    }

    fn row(value: Value) -> RowData {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_insert_one_stamps_and_returns_record() {
        let (mock, ctx) = setup();
        mock.push_rows(vec![json!({"id": 9, "title": "a", "created_at": NOW})]);

        let inserted = ctx
            .model::<Task>()
            .unwrap()
            .insert(row(json!({"title": "a", "created_at": "1999-01-01T00:00:00Z"})))
            .unwrap();

        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO tasks (title, created_at) VALUES (?, ?) RETURNING *"
        );
        assert_eq!(query.params, vec![json!("a"), json!(NOW)]);

        let record = inserted.into_record().unwrap();
        assert_eq!(record.primary_key_value(), Some(&json!(9)));
        assert!(record.dirty_fields().is_empty());
    }

    #[test]
    fn test_insert_without_returning_uses_last_insert_id() {
        let mock = Arc::new(MockExecutor::new().without_returning());
        mock.push_status(ExecutionStatus::inserted(json!(12)));
        let ctx = ModelContext::new(mock.clone());

        let record = ctx
            .model::<Task>()
            .unwrap()
            .insert(row(json!({"title": "b"})))
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(record.primary_key_value(), Some(&json!(12)));
        assert!(!mock.last_query().unwrap().sql.contains("RETURNING"));
        assert_eq!(mock.execute_count(), 1);
    }

    #[test]
    fn test_insert_hook_transforms_row() {
        let (mock, ctx) = setup();
        let hooks = HookSet::new().on_insert(|mut row| {
            row.insert("slug".to_string(), json!("a-slug"));
            Ok(row)
        });

        ctx.model::<Task>()
            .unwrap()
            .with_hooks(hooks)
            .insert(row(json!({"title": "a"})))
            .unwrap();

        assert!(mock.last_query().unwrap().sql.contains("slug"));
    }

    #[test]
    fn test_insert_many_returns_count() {
        let (mock, ctx) = setup();
        mock.push_status(ExecutionStatus::affected(2));

        let inserted = ctx
            .model::<Task>()
            .unwrap()
            .insert(vec![row(json!({"title": "a"})), row(json!({"title": "b"}))])
            .unwrap();

        assert!(matches!(inserted, Inserted::Count(2)));
        assert_eq!(mock.execute_count(), 1);
        assert_eq!(
            mock.last_query().unwrap().sql,
            "INSERT INTO tasks (title, created_at) VALUES (?, ?), (?, ?)"
        );
    }

    #[test]
    fn test_update_by_primary_key() {
        let (mock, ctx) = setup();
        mock.push_status(ExecutionStatus::affected(1));

        let mut task = ctx
            .model::<Task>()
            .unwrap()
            .from_array(row(json!({"id": 4, "title": "old", "done": false})));
        task.set("title", "new");

        let affected = task.update(Some(row(json!({"done": true, "id": 99})))).unwrap();

        assert_eq!(affected, 1);
        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "UPDATE tasks SET updated_at = ?, title = ?, done = ? WHERE id = ?"
        );
        assert_eq!(query.params, vec![json!(NOW), json!("new"), json!(true), json!(4)]);
        assert_eq!(task.get("done"), Some(&json!(true)));
        assert_eq!(task.primary_key_value(), Some(&json!(4)));
        assert!(task.dirty_fields().is_empty());
    }

    #[test]
    fn test_bulk_update_uses_conditions() {
        let (mock, ctx) = setup();
        let mut tasks = ctx.model::<Task>().unwrap().where_("done", false);

        tasks.update(Some(row(json!({"archived": true})))).unwrap();

        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "UPDATE tasks SET updated_at = ?, archived = ? WHERE done = ?"
        );
        assert_eq!(query.params, vec![json!(NOW), json!(true), json!(false)]);
    }

    #[test]
    fn test_empty_update_runs_no_query() {
        let mock = Arc::new(MockExecutor::new());
        let ctx = ModelContext::new(mock.clone());

        struct Plain;
        impl Model for Plain {
            fn table() -> TableMetadata {
                TableMetadata::new("plain", "id")
            }
        }

        let mut record = ctx
            .model::<Plain>()
            .unwrap()
            .from_array(row(json!({"id": 1})));
        assert_eq!(record.update(None).unwrap(), 0);
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_save_inserts_then_updates() {
        let (mock, ctx) = setup();
        mock.push_rows(vec![json!({"id": 21, "title": "a", "created_at": NOW})]);

        let mut task = ctx.model::<Task>().unwrap().from_array(row(json!({"title": "a"})));
        task.save().unwrap();

        assert!(mock.last_query().unwrap().sql.starts_with("INSERT INTO tasks"));
        assert_eq!(task.primary_key_value(), Some(&json!(21)));

        task.set("title", "b");
        task.save().unwrap();
        let query = mock.last_query().unwrap();
        assert!(query.sql.starts_with("UPDATE tasks SET"));
        assert!(query.sql.ends_with("WHERE id = ?"));
        assert_eq!(query.params.last(), Some(&json!(21)));
    }

    #[test]
    fn test_multi_row_record_refuses_save_and_unscoped_update() {
        let (mock, ctx) = setup();
        let mut tasks = ctx
            .model::<Task>()
            .unwrap()
            .from_array(vec![row(json!({"id": 1})), row(json!({"id": 2}))]);

        assert!(matches!(tasks.save(), Err(ActiveRecordError::ViewModel(_))));

        tasks.set("done", true);
        assert!(matches!(tasks.update(None), Err(ActiveRecordError::ViewModel(_))));
        assert!(mock.statements().is_empty());

        let mut scoped = tasks.where_("id", json!([1, 2]));
        assert_eq!(scoped.update(None).unwrap(), 0);
        assert_eq!(
            mock.last_query().unwrap().sql,
            "UPDATE tasks SET updated_at = ?, done = ? WHERE id IN (?, ?)"
        );
    }

    #[test]
    fn test_delete_scopes() {
        let (mock, ctx) = setup();

        let mut task = ctx.model::<Task>().unwrap().from_array(row(json!({"id": 3})));
        task.delete(false).unwrap();
        assert_eq!(mock.last_query().unwrap().sql, "DELETE FROM tasks WHERE id = ?");

        let mut done = ctx.model::<Task>().unwrap().where_("done", true);
        done.delete(false).unwrap();
        assert_eq!(mock.last_query().unwrap().sql, "DELETE FROM tasks WHERE done = ?");

        let mut all = ctx.model::<Task>().unwrap();
        all.delete(true).unwrap();
        assert_eq!(mock.last_query().unwrap().sql, "DELETE FROM tasks");
    }

    #[test]
    fn test_unguarded_delete_is_refused() {
        let (mock, ctx) = setup();
        let mut task = ctx.model::<Task>().unwrap();

        assert!(matches!(
            task.delete(false),
            Err(ActiveRecordError::UnguardedDelete { .. })
        ));
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_delete_hook_can_veto() {
        let (mock, ctx) = setup();
        let hooks = HookSet::new().on_delete(|| Err(anyhow::anyhow!("tasks are permanent")));
        let mut task = ctx
            .model::<Task>()
            .unwrap()
            .with_hooks(hooks)
            .from_array(row(json!({"id": 3})));

        assert!(matches!(task.delete(false), Err(ActiveRecordError::Hook(_))));
        assert!(mock.statements().is_empty());
    }

    #[test]
    fn test_find_and_count() {
        let (mock, ctx) = setup();
        mock.push_rows(vec![json!({"id": 1}), json!({"id": 2})]);
        mock.push_rows(vec![json!({"count": 2})]);
        mock.push_rows(vec![json!({"id": 7})]);

        let open = ctx.model::<Task>().unwrap().where_("done", false);
        let found = open.find().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(open.count().unwrap(), 2);
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT COUNT(*) AS count FROM tasks WHERE done = ?"
        );

        let task = open.find_by_pk(7).unwrap().unwrap();
        assert_eq!(task.primary_key_value(), Some(&json!(7)));
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT * FROM tasks WHERE id = ? LIMIT 1"
        );

        assert!(open.find_one().unwrap().is_none());
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT * FROM tasks WHERE done = ? LIMIT 1"
        );
    }
}
