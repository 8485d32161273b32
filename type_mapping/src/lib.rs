//! Unified type mapping between JSON column values, schema descriptors and PostgreSQL
//! This crate provides the mapping logic used across the rowhaus ecosystem

pub mod bind;
pub mod sql;
pub mod types;

pub use bind::{to_bind_value, to_bind_values};
pub use sql::{column_definition_sql, decode_kind_for_pg_type, numbered_placeholders, pg_type_for};
pub use types::{BindValue, ColumnKind, DecodeKind, FieldSpec};
