use crate::executor::ExecutorError;
use crate::validation::ValidationError;
use hook_system::HookError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActiveRecordError {
    /// Missing table name, primary key or connection handle; never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Query failed on table '{table}': {source} (sql: {sql})")]
    QueryExecution {
        table: String,
        sql: String,
        #[source]
        source: ExecutorError,
    },

    #[error("Table '{table}' does not exist: {source}")]
    MissingTable {
        table: String,
        #[source]
        source: ExecutorError,
    },

    #[error("View model error: {0}")]
    ViewModel(String),

    #[error("Invalid association '{association}' on {model}: {reason}")]
    AssociationConfig {
        model: String,
        association: String,
        reason: String,
    },

    #[error("Unknown association '{name}' on {model}")]
    UnknownAssociation { model: String, name: String },

    #[error("Refusing to delete every row of '{table}' without conditions; pass delete_all = true")]
    UnguardedDelete { table: String },

    #[error("Query build error: {0}")]
    QueryBuild(String),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ActiveRecordError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn query_execution(table: &str, sql: &str, source: ExecutorError) -> Self {
        Self::QueryExecution {
            table: table.to_string(),
            sql: sql.to_string(),
            source,
        }
    }

    pub fn association_config(model: &str, association: &str, reason: impl Into<String>) -> Self {
        Self::AssociationConfig {
            model: model.to_string(),
            association: association.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the database rather than from local usage
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            Self::QueryExecution { .. } | Self::MissingTable { .. }
        )
    }
}

pub type Result<T, E = ActiveRecordError> = std::result::Result<T, E>;
