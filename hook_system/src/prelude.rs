//! Convenience re-exports for common hook-system usage

pub use crate::kind::{HookError, HookKind};
pub use crate::manager::HookSet;
pub use crate::types::{DeleteHook, RowData, RowHook};

// Common external dependencies
pub use anyhow;
pub use serde_json;
