//! Core RowHaus functionality
//!
//! This module contains the main RowHaus struct: one execution context per
//! configured connection alias, all sharing a single class registry.

use active_record::{ActiveRecord, AssociationRegistry, Model, ModelContext, QueryExecutor};
use config::{AppConfig, DatabaseConfig, OrmConfig, DEFAULT_CONNECTION};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::errors::RowHausError;
use crate::pg::PgExecutor;

/// Connection registry and entry point for model instances
pub struct RowHaus {
    contexts: HashMap<String, ModelContext>,
    pools: HashMap<String, PgPool>,
    registry: Arc<AssociationRegistry>,
    default_connection: String,
    runtime: Option<Arc<Runtime>>,
}

impl RowHaus {
    /// Connect every alias in `config`
    pub fn new(config: AppConfig) -> Result<Self, RowHausError> {
        config.validate()?;

        let runtime = Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?,
        );
        let registry = Arc::new(AssociationRegistry::new());

        let mut contexts = HashMap::new();
        let mut pools = HashMap::new();
        for (alias, database) in &config.connections {
            crate::debug_log!("Connecting alias {} to {}:{}", alias, database.host, database.port);
            let pool = runtime.block_on(connect(database))?;
            let executor = PgExecutor::new(pool.clone(), Arc::clone(&runtime));
            contexts.insert(
                alias.clone(),
                context_for(Arc::new(executor), &registry, &config.orm),
            );
            pools.insert(alias.clone(), pool);
        }

        Ok(Self {
            contexts,
            pools,
            registry,
            default_connection: config.orm.default_connection,
            runtime: Some(runtime),
        })
    }

    /// Load configuration the way [`AppConfig::load`] does, then connect
    pub fn from_env() -> Result<Self, RowHausError> {
        Self::new(AppConfig::load()?)
    }

    /// Registry over already-built executors, keyed by alias
    pub fn with_executors<I>(orm: OrmConfig, executors: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn QueryExecutor>)>,
    {
        let registry = Arc::new(AssociationRegistry::new());
        let contexts = executors
            .into_iter()
            .map(|(alias, executor)| (alias, context_for(executor, &registry, &orm)))
            .collect();

        Self {
            contexts,
            pools: HashMap::new(),
            registry,
            default_connection: orm.default_connection,
            runtime: None,
        }
    }

    /// Context for a connection alias
    pub fn context(&self, alias: &str) -> Result<&ModelContext, RowHausError> {
        self.contexts
            .get(alias)
            .ok_or_else(|| RowHausError::ConnectionNotFound(alias.to_string()))
    }

    /// Alias `M` runs against; models without their own use the configured default
    pub fn alias_for<M: Model>(&self) -> &str {
        match M::connection() {
            DEFAULT_CONNECTION => self.default_connection.as_str(),
            alias => alias,
        }
    }

    /// Fresh instance of `M` bound to its connection
    pub fn model<M: Model>(&self) -> Result<ActiveRecord, RowHausError> {
        let ctx = self.context(self.alias_for::<M>())?;
        Ok(ctx.model::<M>()?)
    }

    pub fn registry(&self) -> &Arc<AssociationRegistry> {
        &self.registry
    }

    /// Pool behind an alias; `None` for registries built from executors
    pub fn pool(&self, alias: &str) -> Option<&PgPool> {
        self.pools.get(alias)
    }

    pub fn aliases(&self) -> Vec<&String> {
        let mut aliases: Vec<_> = self.contexts.keys().collect();
        aliases.sort();
        aliases
    }

    /// Check database connection health for every pooled alias
    pub fn health_check(&self) -> Result<(), RowHausError> {
        let Some(runtime) = &self.runtime else {
            return Ok(());
        };
        for (alias, pool) in &self.pools {
            crate::trace_log!("Health check on {}", alias);
            runtime.block_on(sqlx::query("SELECT 1").fetch_one(pool))?;
        }
        Ok(())
    }
}

async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let connection_string = config.connection_string();

    let mut pool_options = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

    // Zero means connections live as long as the pool
    if config.max_lifetime_seconds > 0 {
        pool_options = pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
    }

    pool_options.connect(&connection_string).await
}

fn context_for(
    executor: Arc<dyn QueryExecutor>,
    registry: &Arc<AssociationRegistry>,
    orm: &OrmConfig,
) -> ModelContext {
    ModelContext::new(executor)
        .with_registry(Arc::clone(registry))
        .with_auto_create_tables(orm.auto_create_tables)
}
