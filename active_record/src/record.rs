//! Active-record row wrapper
//!
//! An [`ActiveRecord`] holds either one row (`is_single_row`) or a hydrated
//! sequence of rows, the set of keys changed since hydration, the conditions
//! accumulated for bulk operations, and per-instance association caches.

use crate::association::registry::ModelClass;
use crate::association::Related;
use crate::context::ModelContext;
use crate::errors::{ActiveRecordError, Result};
use crate::query_builder::ConditionBuilder;
use crate::table_metadata::TableMetadata;
use crate::traits::Filterable;
use crate::RowData;
use hook_system::HookSet;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Row data handed to [`ActiveRecord::from_array`]
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    One(RowData),
    Many(Vec<RowData>),
}

impl From<RowData> for Rows {
    fn from(row: RowData) -> Self {
        Rows::One(row)
    }
}

impl From<Vec<RowData>> for Rows {
    fn from(rows: Vec<RowData>) -> Self {
        Rows::Many(rows)
    }
}

#[derive(Clone)]
pub struct ActiveRecord {
    pub(crate) class: Arc<ModelClass>,
    pub(crate) ctx: ModelContext,
    pub(crate) data: RowData,
    pub(crate) rows: Vec<RowData>,
    pub(crate) is_single_row: bool,
    pub(crate) dirty: BTreeSet<String>,
    pub(crate) conditions: ConditionBuilder,
    pub(crate) hooks: HookSet,
    pub(crate) eager_cache: HashMap<String, Related>,
    pub(crate) backrefs: HashMap<String, ActiveRecord>,
}

impl fmt::Debug for ActiveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRecord")
            .field("table", &self.class.table().name)
            .field("data", &self.data)
            .field("rows", &self.rows.len())
            .field("is_single_row", &self.is_single_row)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Filterable for ActiveRecord {
    fn conditions_mut(&mut self) -> &mut ConditionBuilder {
        &mut self.conditions
    }
}

impl ActiveRecord {
    pub(crate) fn new(class: Arc<ModelClass>, ctx: ModelContext) -> Self {
        let conditions = ConditionBuilder::with_primary_key(class.table().primary_key.clone());
        let hooks = class.hooks().clone();
        Self {
            class,
            ctx,
            data: RowData::new(),
            rows: Vec::new(),
            is_single_row: true,
            dirty: BTreeSet::new(),
            conditions,
            hooks,
            eager_cache: HashMap::new(),
            backrefs: HashMap::new(),
        }
    }

    /// Single-row instance of the same class holding `row`, nothing dirty
    pub(crate) fn hydrate(&self, row: RowData) -> Self {
        Self::new(Arc::clone(&self.class), self.ctx.clone()).from_array(Rows::One(row))
    }

    /// Replace the row data; a map makes a single-row instance, a sequence a
    /// multi-row one. Nothing is marked dirty and no query runs.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_array(mut self, rows: impl Into<Rows>) -> Self {
        match rows.into() {
            Rows::One(row) => {
                self.data = row;
                self.rows.clear();
                self.is_single_row = true;
            }
            Rows::Many(rows) => {
                self.data = RowData::new();
                self.rows = rows;
                self.is_single_row = false;
            }
        }
        self.dirty.clear();
        self.eager_cache.clear();
        self.backrefs.clear();
        self
    }

    /// [`from_array`](Self::from_array) for a JSON object or array of objects
    #[allow(clippy::wrong_self_convention)]
    pub fn from_json(self, value: Value) -> Result<Self> {
        match value {
            Value::Object(row) => Ok(self.from_array(Rows::One(row))),
            Value::Array(items) => {
                let rows = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(row) => Ok(row),
                        other => Err(ActiveRecordError::ViewModel(format!(
                            "expected a JSON object per row, got {}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.from_array(Rows::Many(rows)))
            }
            other => Err(ActiveRecordError::ViewModel(format!(
                "expected a JSON object or array of objects, got {}",
                other
            ))),
        }
    }

    /// Replace the hooks this instance runs
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        self.data.insert(key.clone(), value.into());
        self.dirty.insert(key);
        self
    }

    pub fn set_all(&mut self, values: RowData) -> &mut Self {
        for (key, value) in values {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Primary-key value, `None` when absent or null
    pub fn primary_key_value(&self) -> Option<&Value> {
        self.data
            .get(&self.class.table().primary_key)
            .filter(|value| !value.is_null())
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty.contains(key)
    }

    pub fn dirty_fields(&self) -> Vec<&str> {
        self.dirty.iter().map(String::as_str).collect()
    }

    pub fn is_single_row(&self) -> bool {
        self.is_single_row
    }

    pub fn data(&self) -> &RowData {
        &self.data
    }

    /// Rows of a multi-row instance
    pub fn rows(&self) -> &[RowData] {
        &self.rows
    }

    pub fn table(&self) -> &TableMetadata {
        self.class.table()
    }

    pub fn class(&self) -> &Arc<ModelClass> {
        &self.class
    }

    pub fn context(&self) -> &ModelContext {
        &self.ctx
    }

    pub fn conditions(&self) -> &ConditionBuilder {
        &self.conditions
    }

    /// Flat column map of a single-row instance
    pub fn get_view_model(&self) -> Result<RowData> {
        if !self.is_single_row {
            return Err(ActiveRecordError::ViewModel(format!(
                "'{}' holds {} rows; a view model needs exactly one",
                self.class.table().name,
                self.rows.len()
            )));
        }
        Ok(self.data.clone())
    }

    /// Split a multi-row instance into single-row records
    pub fn into_result_set(self) -> ResultSet {
        if self.is_single_row {
            return ResultSet::from(vec![self]);
        }
        let records = self
            .rows
            .iter()
            .map(|row| self.hydrate(row.clone()))
            .collect::<Vec<_>>();
        ResultSet::from(records)
    }

    /// Copy of the row without caches, backrefs or pending conditions
    pub(crate) fn snapshot(&self) -> Self {
        let mut copy = Self::new(Arc::clone(&self.class), self.ctx.clone());
        copy.data = self.data.clone();
        copy.rows = self.rows.clone();
        copy.is_single_row = self.is_single_row;
        copy.dirty = self.dirty.clone();
        copy.hooks = self.hooks.clone();
        copy
    }
}

/// Ordered records of one class
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<ActiveRecord>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&ActiveRecord> {
        self.records.first()
    }

    pub fn get(&self, index: usize) -> Option<&ActiveRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ActiveRecord> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActiveRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ActiveRecord> {
        self.records.iter_mut()
    }

    /// Column maps of every record
    pub fn to_rows(&self) -> Vec<RowData> {
        self.records.iter().map(|r| r.data.clone()).collect()
    }

    pub fn into_vec(self) -> Vec<ActiveRecord> {
        self.records
    }
}

impl From<Vec<ActiveRecord>> for ResultSet {
    fn from(records: Vec<ActiveRecord>) -> Self {
        Self { records }
    }
}

impl IntoIterator for ResultSet {
    type Item = ActiveRecord;
    type IntoIter = std::vec::IntoIter<ActiveRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ActiveRecord;
    type IntoIter = std::slice::Iter<'a, ActiveRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
