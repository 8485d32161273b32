//! # RowHaus
//!
//! An Active Record layer for PostgreSQL: models declare their table and
//! associations, instances wrap rows, and a fluent condition builder renders
//! parameterised SQL.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowhaus::prelude::*;
//!
//! struct User;
//!
//! impl Model for User {
//!     fn table() -> TableMetadata {
//!         TableMetadata::new("users", "id")
//!             .column("id", FieldSpec::integer().auto_increment())
//!             .column("name", FieldSpec::varchar(120).not_null())
//!             .column("email", FieldSpec::varchar(255))
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "rowhaus".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!
//!     let haus = RowHaus::new(AppConfig::single(config, OrmConfig::default()))?;
//!     haus.auto_migrate::<User>(false)?;
//!
//!     let mut row = RowData::new();
//!     row.insert("name".into(), "John Doe".into());
//!     row.insert("email".into(), "john@example.com".into());
//!     let created = haus.model::<User>()?.insert(row)?.into_record();
//!     println!("Created user: {:?}", created.map(|u| u.get("id").cloned()));
//!
//!     let johns = haus.model::<User>()?.where_like("name", "John%").find()?;
//!     println!("Found {} users", johns.len());
//!
//!     Ok(())
//! }
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

pub mod core;
pub mod errors;
pub mod migration;
pub mod pg;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::RowHaus;
pub use errors::RowHausError;
pub use pg::PgExecutor;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, OrmConfig};

// Re-export internal crates used by the public API
pub use active_record;
pub use hook_system;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use sqlx;
