//! Per-class metadata registry
//!
//! A model's table metadata and association definitions are resolved the
//! first time the class is requested and never rebuilt afterwards. Each class
//! key owns an exactly-once cell, so concurrent first requests from several
//! threads run a single build; a build that fails leaves the cell empty and
//! the next request tries again.

use crate::association::definition::{AssociationDeclaration, AssociationDefinition};
use crate::errors::{ActiveRecordError, Result};
use crate::table_metadata::TableMetadata;
use crate::traits::{Model, ModelKey};
use crate::validation::validate_column_name;
use hook_system::HookSet;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Everything the record layer needs to know about one model type
#[derive(Debug)]
pub struct ModelClass {
    key: ModelKey,
    table: TableMetadata,
    associations: Vec<AssociationDefinition>,
    hooks: HookSet,
    connection: &'static str,
}

impl ModelClass {
    pub fn key(&self) -> ModelKey {
        self.key
    }

    pub fn table(&self) -> &TableMetadata {
        &self.table
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    pub fn connection(&self) -> &'static str {
        self.connection
    }

    /// Associations in declaration order
    pub fn associations(&self) -> &[AssociationDefinition] {
        &self.associations
    }

    pub fn association(&self, name: &str) -> Option<&AssociationDefinition> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// First association whose target is `key`
    pub fn association_to(&self, key: ModelKey) -> Option<&AssociationDefinition> {
        self.associations.iter().find(|a| a.target.key() == key)
    }
}

type ClassCell = Arc<OnceCell<Arc<ModelClass>>>;

#[derive(Default)]
pub struct AssociationRegistry {
    classes: RwLock<HashMap<ModelKey, ClassCell>>,
    builds: AtomicUsize,
    builds_per_class: Mutex<HashMap<ModelKey, usize>>,
}

impl std::fmt::Debug for AssociationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationRegistry")
            .field("builds", &self.build_count())
            .finish()
    }
}

impl AssociationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved class for `M`, built on first request
    pub fn class<M: Model>(&self) -> Result<Arc<ModelClass>> {
        let key = ModelKey::of::<M>();
        let cell = self.cell(key);
        cell.get_or_try_init(|| self.build::<M>(key)).map(Arc::clone)
    }

    /// Whether `M` has already been built successfully
    pub fn is_built<M: Model>(&self) -> bool {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes
            .get(&ModelKey::of::<M>())
            .map(|cell| cell.get().is_some())
            .unwrap_or(false)
    }

    /// Completed builds across all classes
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Completed builds of `M`; at most one
    pub fn build_count_for<M: Model>(&self) -> usize {
        let counts = self
            .builds_per_class
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        counts.get(&ModelKey::of::<M>()).copied().unwrap_or(0)
    }

    fn cell(&self, key: ModelKey) -> ClassCell {
        {
            let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cell) = classes.get(&key) {
                return Arc::clone(cell);
            }
        }

        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(classes.entry(key).or_default())
    }

    fn build<M: Model>(&self, key: ModelKey) -> Result<Arc<ModelClass>> {
        crate::debug_log!("Building model class {}", key);

        let table = M::table();
        table.validate()?;

        let mut associations: Vec<AssociationDefinition> = Vec::new();
        for declaration in M::associations() {
            let definition = resolve_declaration(key, &table, declaration)?;
            if associations.iter().any(|a| a.name == definition.name) {
                return Err(ActiveRecordError::association_config(
                    key.name(),
                    &definition.name,
                    "association declared more than once",
                ));
            }
            associations.push(definition);
        }

        let class = Arc::new(ModelClass {
            key,
            table,
            associations,
            hooks: M::hooks(),
            connection: M::connection(),
        });

        self.builds.fetch_add(1, Ordering::SeqCst);
        *self
            .builds_per_class
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(0) += 1;

        crate::debug_log!(
            "Built model class {} (table {}, {} associations)",
            key,
            class.table.name,
            class.associations.len()
        );
        Ok(class)
    }
}

fn resolve_declaration(
    model: ModelKey,
    table: &TableMetadata,
    declaration: AssociationDeclaration,
) -> Result<AssociationDefinition> {
    let name = declaration.name;
    let invalid = |reason: String| ActiveRecordError::association_config(model.name(), &name, reason);

    if name.is_empty() {
        return Err(invalid("association name cannot be empty".to_string()));
    }

    let target_table = declaration.target.table();
    target_table.validate().map_err(|e| {
        invalid(format!(
            "target {} is not a usable model: {}",
            declaration.target.key(),
            e
        ))
    })?;

    let local_key = declaration
        .local_key
        .unwrap_or_else(|| table.primary_key.clone());
    let foreign_key = declaration
        .foreign_key
        .unwrap_or_else(|| table.foreign_key_for(&table.name));

    for column in [&local_key, &foreign_key] {
        validate_column_name(column).map_err(|e| invalid(e.to_string()))?;
    }

    Ok(AssociationDefinition {
        name: name.clone(),
        target: declaration.target,
        kind: declaration.kind,
        local_key,
        foreign_key,
        filter: declaration.filter,
        sort: declaration.sort,
        columns: declaration.columns.unwrap_or_else(|| "*".to_string()),
        backref: declaration.backref,
    })
}
