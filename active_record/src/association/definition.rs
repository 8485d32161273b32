//! Association declarations and their resolved definitions

use crate::association::registry::{AssociationRegistry, ModelClass};
use crate::errors::Result;
use crate::table_metadata::TableMetadata;
use crate::traits::{Model, ModelKey};
use crate::RowData;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Cardinality and loading strategy of an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationKind {
    /// Single row, queried on first access and cached on the instance
    EagerOne,
    /// Row set, queried on first access and cached on the instance
    #[default]
    EagerMany,
    /// Single row, queried on every access
    LazyOne,
    /// Row set, queried on every access
    LazyMany,
}

impl AssociationKind {
    pub fn is_eager(&self) -> bool {
        matches!(self, AssociationKind::EagerOne | AssociationKind::EagerMany)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, AssociationKind::EagerOne | AssociationKind::LazyOne)
    }

    fn with_one(self, one: bool) -> Self {
        match (self.is_eager(), one) {
            (true, true) => AssociationKind::EagerOne,
            (true, false) => AssociationKind::EagerMany,
            (false, true) => AssociationKind::LazyOne,
            (false, false) => AssociationKind::LazyMany,
        }
    }

    fn with_lazy(self) -> Self {
        if self.is_one() {
            AssociationKind::LazyOne
        } else {
            AssociationKind::LazyMany
        }
    }
}

/// Target model of an association, resolved through the registry on use
#[derive(Clone, Copy)]
pub struct AssociationTarget {
    key: ModelKey,
    resolve: fn(&AssociationRegistry) -> Result<Arc<ModelClass>>,
    table: fn() -> TableMetadata,
}

impl AssociationTarget {
    pub fn of<T: Model>() -> Self {
        Self {
            key: ModelKey::of::<T>(),
            resolve: AssociationRegistry::class::<T>,
            table: T::table,
        }
    }

    pub fn key(&self) -> ModelKey {
        self.key
    }

    /// Fetch (building if needed) the target's class from `registry`
    pub fn resolve(&self, registry: &AssociationRegistry) -> Result<Arc<ModelClass>> {
        (self.resolve)(registry)
    }

    /// Target's declared table metadata, without touching the registry
    pub fn table(&self) -> TableMetadata {
        (self.table)()
    }
}

impl fmt::Debug for AssociationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssociationTarget").field(&self.key).finish()
    }
}

/// Declaration of one association, as written by a [`Model`]
#[derive(Debug, Clone)]
pub struct AssociationDeclaration {
    pub(crate) name: String,
    pub(crate) target: AssociationTarget,
    pub(crate) kind: AssociationKind,
    pub(crate) local_key: Option<String>,
    pub(crate) foreign_key: Option<String>,
    pub(crate) filter: RowData,
    pub(crate) sort: Option<String>,
    pub(crate) columns: Option<String>,
    pub(crate) backref: bool,
}

impl AssociationDeclaration {
    pub fn new<T: Model>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: AssociationTarget::of::<T>(),
            kind: AssociationKind::default(),
            local_key: None,
            foreign_key: None,
            filter: RowData::new(),
            sort: None,
            columns: None,
            backref: false,
        }
    }

    pub fn kind(mut self, kind: AssociationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Resolve to a single row (keeps eager/lazy)
    pub fn one(mut self) -> Self {
        self.kind = self.kind.with_one(true);
        self
    }

    /// Resolve to a row set (keeps eager/lazy)
    pub fn many(mut self) -> Self {
        self.kind = self.kind.with_one(false);
        self
    }

    /// Query on every access instead of caching the first result
    pub fn lazy(mut self) -> Self {
        self.kind = self.kind.with_lazy();
        self
    }

    /// Column on the declaring model whose value is matched
    pub fn local_key(mut self, column: impl Into<String>) -> Self {
        self.local_key = Some(column.into());
        self
    }

    /// Column on the target model matched against the local key
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Extra condition on the target rows; keys follow `where_` expansion rules
    pub fn filter(mut self, fragment: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(fragment.into(), value.into());
        self
    }

    /// ORDER BY expression for the target rows
    pub fn sort(mut self, expr: impl Into<String>) -> Self {
        self.sort = Some(expr.into());
        self
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Hand each related row a snapshot of the origin row
    pub fn backref(mut self) -> Self {
        self.backref = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Resolved, immutable association
#[derive(Debug, Clone)]
pub struct AssociationDefinition {
    pub name: String,
    pub target: AssociationTarget,
    pub kind: AssociationKind,
    pub local_key: String,
    pub foreign_key: String,
    pub filter: RowData,
    pub sort: Option<String>,
    pub columns: String,
    pub backref: bool,
}
