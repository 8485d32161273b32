//! Association resolution on a loaded record

use crate::association::definition::AssociationDefinition;
use crate::association::merge::{deep_merge, AssociationOverride};
use crate::association::registry::ModelClass;
use crate::errors::{ActiveRecordError, Result};
use crate::query_builder::{ConditionBuilder, Params, SqlGenerator};
use crate::record::{ActiveRecord, ResultSet};
use crate::traits::Filterable;
use serde_json::Value;
use std::sync::Arc;

/// Outcome of resolving an association
#[derive(Debug, Clone)]
pub enum Related {
    One(Box<ActiveRecord>),
    Many(ResultSet),
    NotFound,
}

impl Related {
    pub fn one(&self) -> Option<&ActiveRecord> {
        match self {
            Related::One(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    pub fn many(&self) -> Option<&ResultSet> {
        match self {
            Related::Many(set) => Some(set),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Related::NotFound)
    }

    /// Number of related rows
    pub fn len(&self) -> usize {
        match self {
            Related::One(_) => 1,
            Related::Many(set) => set.len(),
            Related::NotFound => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActiveRecord {
    /// [`association`](Self::association) with the declared filter, sort and columns
    pub fn related(&mut self, name: &str) -> Result<Related> {
        self.association(name, AssociationOverride::None)
    }

    /// Resolve the association `name` for this row.
    ///
    /// Eager associations called without an override are answered from the
    /// instance cache after the first query. An override always queries and
    /// leaves the cache untouched. A row handed to this one as a backref
    /// answers the inverse association without a query.
    pub fn association(
        &mut self,
        name: &str,
        overrides: impl Into<AssociationOverride>,
    ) -> Result<Related> {
        let overrides = overrides.into();

        if !self.is_single_row {
            return Err(ActiveRecordError::ViewModel(format!(
                "association '{}' needs a single-row '{}' record",
                name,
                self.table().name
            )));
        }

        if overrides.is_none() {
            if let Some(origin) = self.backrefs.get(name) {
                return Ok(Related::One(Box::new(origin.clone())));
            }
        }

        let definition = self
            .class
            .association(name)
            .cloned()
            .ok_or_else(|| ActiveRecordError::UnknownAssociation {
                model: self.class.key().name().to_string(),
                name: name.to_string(),
            })?;

        let cacheable = definition.kind.is_eager() && overrides.is_none();
        if cacheable {
            if let Some(cached) = self.eager_cache.get(name) {
                crate::trace_log!("Association {} served from cache", name);
                return Ok(cached.clone());
            }
        }

        let related = self.query_association(&definition, overrides)?;

        if cacheable {
            self.eager_cache.insert(name.to_string(), related.clone());
        }
        Ok(related)
    }

    fn query_association(
        &self,
        definition: &AssociationDefinition,
        overrides: AssociationOverride,
    ) -> Result<Related> {
        let empty = || {
            if definition.kind.is_one() {
                Related::NotFound
            } else {
                Related::Many(ResultSet::default())
            }
        };

        let local_value = match self.data.get(&definition.local_key) {
            Some(value) if !value.is_null() => value.clone(),
            _ => return Ok(empty()),
        };

        let target = definition.target.resolve(self.ctx.registry())?;
        let builder = association_query(definition, &target, local_value, overrides)?;

        let table = target.table();
        let (sql, params) = SqlGenerator::select(&table.name, &builder)?;
        crate::debug_log!("Resolving association {} on {}", definition.name, table.name);
        let rows = self.ctx.fetch(table, &sql, &params)?;

        let backref = definition.backref.then(|| {
            let name = target
                .association_to(self.class.key())
                .map(|a| a.name.clone())
                .unwrap_or_else(|| self.table().name.clone());
            (name, self.snapshot())
        });

        let records = rows
            .into_iter()
            .map(|row| {
                let mut record = ActiveRecord::new(Arc::clone(&target), self.ctx.clone())
                    .from_array(row);
                if let Some((name, origin)) = &backref {
                    record.backrefs.insert(name.clone(), origin.clone());
                }
                record
            })
            .collect::<Vec<_>>();

        if definition.kind.is_one() {
            Ok(records
                .into_iter()
                .next()
                .map(|record| Related::One(Box::new(record)))
                .unwrap_or(Related::NotFound))
        } else {
            Ok(Related::Many(ResultSet::from(records)))
        }
    }
}

/// Conditions and options for one association query.
///
/// The merged filter renders as one parenthesized clause so an `OR` inside it
/// can't escape the foreign-key scope.
fn association_query(
    definition: &AssociationDefinition,
    target: &ModelClass,
    local_value: Value,
    overrides: AssociationOverride,
) -> Result<ConditionBuilder> {
    let mut builder = ConditionBuilder::with_primary_key(target.table().primary_key.clone())
        .where_(&definition.foreign_key, local_value);

    let (filter, sort, columns) = match overrides {
        AssociationOverride::None => (
            Some(definition.filter.clone()),
            definition.sort.clone(),
            definition.columns.clone(),
        ),
        AssociationOverride::Condition(fragment) => {
            builder = builder.where_(&format!("({})", fragment), ());
            (None, definition.sort.clone(), definition.columns.clone())
        }
        AssociationOverride::Structured {
            where_,
            sort,
            columns,
        } => (
            Some(deep_merge(&definition.filter, &where_)),
            sort.or_else(|| definition.sort.clone()),
            columns.unwrap_or_else(|| definition.columns.clone()),
        ),
    };

    let mut scoped = ConditionBuilder::new();
    for (fragment, value) in filter.unwrap_or_default() {
        scoped = scoped.where_(&fragment, Params::from(value));
    }
    let (filter_sql, filter_params) = scoped.build_where()?;
    if !filter_sql.is_empty() {
        builder
            .conditions_mut()
            .push_expanded(format!("({})", filter_sql), filter_params);
    }

    builder = builder.select(&columns);
    if let Some(sort) = sort {
        builder = builder.order_by_raw(&sort);
    }
    if definition.kind.is_one() {
        builder = builder.limit(1);
    }
    Ok(builder)
}
