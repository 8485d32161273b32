//! Type definitions for the hook system

use serde_json::{Map, Value};

/// Ordered column-name → value mapping for one row
pub type RowData = Map<String, Value>;

/// Transform applied to row data right before it is inserted or updated.
///
/// The returned map replaces the data that is persisted.
pub trait RowHook: Send + Sync {
    fn transform(&self, data: RowData) -> anyhow::Result<RowData>;
}

impl<F> RowHook for F
where
    F: Fn(RowData) -> anyhow::Result<RowData> + Send + Sync,
{
    fn transform(&self, data: RowData) -> anyhow::Result<RowData> {
        self(data)
    }
}

/// Callback run right before a delete statement; an error vetoes the delete
pub trait DeleteHook: Send + Sync {
    fn before_delete(&self) -> anyhow::Result<()>;
}

impl<F> DeleteHook for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn before_delete(&self) -> anyhow::Result<()> {
        self()
    }
}
