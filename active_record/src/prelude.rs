//! Convenience re-exports for common active-record usage

// Model declaration
pub use crate::association::{AssociationDeclaration, AssociationKind, AssociationOverride};
pub use crate::table_metadata::{ColumnDef, TableMetadata, Timestampable};
pub use crate::traits::{Filterable, Model};

// Records and results
pub use crate::association::Related;
pub use crate::context::ModelContext;
pub use crate::persistence::{InsertData, Inserted};
pub use crate::record::{ActiveRecord, ResultSet, Rows};

// Query building
pub use crate::query_builder::{ConditionBuilder, Params, SortOrder};

// Execution
pub use crate::executor::{ExecutionStatus, ExecutorError, QueryExecutor};
pub use crate::mock::MockExecutor;

// Error types
pub use crate::errors::ActiveRecordError;

// Hooks and column types used in declarations
pub use hook_system::{HookSet, RowData};
pub use type_mapping::{ColumnKind, FieldSpec};
