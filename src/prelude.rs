//! Convenience re-exports for common RowHaus usage
//!
//! This prelude module re-exports the most commonly used items from the RowHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use rowhaus::prelude::*;
//!
//! let builder = ConditionBuilder::new().where_("status", "open");
//! assert!(builder.has_conditions());
//! ```

// Core RowHaus components
pub use crate::core::RowHaus;
pub use crate::errors::RowHausError;
pub use crate::pg::PgExecutor;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, OrmConfig};

// Model declaration, records, query building and hooks
pub use active_record::prelude::*;

// Common external dependencies
pub use anyhow;
pub use serde_json::{json, Value};
pub use sqlx::PgPool;
