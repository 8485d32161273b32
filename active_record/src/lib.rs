//! Active Record - row wrapper, condition builder and association engine for rowhaus
//!
//! This crate provides the database-agnostic core: models declare their table
//! and associations, a [`ModelContext`] hands out [`ActiveRecord`] instances,
//! and every statement is rendered with `?` placeholders and passed to a
//! [`QueryExecutor`].
//!
//! ```
//! use active_record::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct User;
//!
//! impl Model for User {
//!     fn table() -> TableMetadata {
//!         TableMetadata::new("users", "id")
//!     }
//! }
//!
//! let mock = Arc::new(MockExecutor::new());
//! mock.push_rows(vec![json!({"id": 1, "name": "Ann"})]);
//! let ctx = ModelContext::new(mock.clone());
//!
//! let users = ctx.model::<User>()?.where_("name", "Ann").find()?;
//! assert_eq!(users.len(), 1);
//! assert_eq!(mock.statements(), vec!["SELECT * FROM users WHERE name = ?"]);
//! # Ok::<(), active_record::ActiveRecordError>(())
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod association;
pub mod context;
pub mod errors;
pub mod executor;
pub mod mock;
pub mod persistence;
pub mod prelude;
pub mod query_builder;
pub mod record;
pub mod table_metadata;
pub mod traits;
pub mod validation;

pub use association::{
    AssociationDeclaration, AssociationKind, AssociationOverride, AssociationRegistry, ModelClass,
    Related,
};
pub use context::ModelContext;
pub use errors::{ActiveRecordError, Result};
pub use executor::{ExecutionStatus, ExecutorError, QueryExecutor, PG_UNDEFINED_TABLE};
pub use hook_system::RowData;
pub use persistence::{InsertData, Inserted};
pub use query_builder::{ConditionBuilder, Params, SortOrder};
pub use record::{ActiveRecord, ResultSet, Rows};
pub use table_metadata::{ColumnDef, TableMetadata, Timestampable};
pub use traits::{Filterable, Model, ModelKey};
pub use validation::ValidationError;
