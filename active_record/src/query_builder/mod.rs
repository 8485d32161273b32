//! Query builder utilities
//!
//! Condition trees with grouping plus the statement renderer used by the
//! record layer.

pub mod builder;
pub mod filter;
pub mod grouping;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;


pub use builder::{ConditionBuilder, DEFAULT_PRIMARY_KEY};
pub use filter::{ConditionClause, ConditionGroup, LogicalOperator, Params};
pub use grouping::GroupBy;
pub use ordering::{OrderTerm, SortOrder};
pub use pagination::Pagination;
pub use sql_generation::SqlGenerator;
