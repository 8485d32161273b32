//! Hook system for record persistence
//!
//! This crate provides the insert/update/delete hooks a model instance can
//! register to transform (or veto) the data that is actually persisted.

pub mod kind;
pub mod manager;
pub mod prelude;
pub mod types;

pub use kind::{HookError, HookKind};
pub use manager::HookSet;
pub use types::{DeleteHook, RowData, RowHook};
