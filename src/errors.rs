//! Error types for the rowhaus crate
//!
//! This module contains all error types that can be returned by RowHaus operations.

use active_record::ActiveRecordError;
use config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ActiveRecord(#[from] ActiveRecordError),

    #[error("Connection alias not configured: {0}")]
    ConnectionNotFound(String),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
