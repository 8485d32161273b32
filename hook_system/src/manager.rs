use crate::kind::{HookError, HookKind};
use crate::types::{DeleteHook, RowData, RowHook};
use std::sync::Arc;

/// Hooks registered on one model instance.
///
/// Each slot holds at most one hook; a missing hook is an identity pass-through.
#[derive(Clone, Default)]
pub struct HookSet {
    on_insert: Option<Arc<dyn RowHook>>,
    on_update: Option<Arc<dyn RowHook>>,
    on_delete: Option<Arc<dyn DeleteHook>>,
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet")
            .field("on_insert", &self.on_insert.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .finish()
    }
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the insert hook, replacing any previous one
    pub fn on_insert<F>(self, hook: F) -> Self
    where
        F: Fn(RowData) -> anyhow::Result<RowData> + Send + Sync + 'static,
    {
        self.on_insert_hook(hook)
    }

    /// Register the update hook, replacing any previous one
    pub fn on_update<F>(self, hook: F) -> Self
    where
        F: Fn(RowData) -> anyhow::Result<RowData> + Send + Sync + 'static,
    {
        self.on_update_hook(hook)
    }

    /// Register the delete hook, replacing any previous one
    pub fn on_delete<F>(self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_delete_hook(hook)
    }

    /// Register a strategy object as the insert hook
    pub fn on_insert_hook<H>(mut self, hook: H) -> Self
    where
        H: RowHook + 'static,
    {
        self.on_insert = Some(Arc::new(hook));
        self
    }

    pub fn on_update_hook<H>(mut self, hook: H) -> Self
    where
        H: RowHook + 'static,
    {
        self.on_update = Some(Arc::new(hook));
        self
    }

    pub fn on_delete_hook<H>(mut self, hook: H) -> Self
    where
        H: DeleteHook + 'static,
    {
        self.on_delete = Some(Arc::new(hook));
        self
    }

    pub fn has(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::Insert => self.on_insert.is_some(),
            HookKind::Update => self.on_update.is_some(),
            HookKind::Delete => self.on_delete.is_some(),
        }
    }

    pub fn apply_insert(&self, data: RowData) -> Result<RowData, HookError> {
        Self::apply(HookKind::Insert, self.on_insert.as_deref(), data)
    }

    pub fn apply_update(&self, data: RowData) -> Result<RowData, HookError> {
        Self::apply(HookKind::Update, self.on_update.as_deref(), data)
    }

    pub fn run_delete(&self) -> Result<(), HookError> {
        match &self.on_delete {
            Some(hook) => {
                tracing::trace!("running delete hook");
                hook.before_delete()
                    .map_err(|e| HookError::new(HookKind::Delete, e))
            }
            None => Ok(()),
        }
    }

    fn apply(
        kind: HookKind,
        hook: Option<&dyn RowHook>,
        data: RowData,
    ) -> Result<RowData, HookError> {
        match hook {
            Some(hook) => {
                tracing::trace!(%kind, fields = data.len(), "running row hook");
                hook.transform(data).map_err(|e| HookError::new(kind, e))
            }
            None => Ok(data),
        }
    }
}
