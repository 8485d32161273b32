//! # Configuration Management for rowhaus
//!
//! This crate provides the configuration structures for rowhaus: one database
//! connection per named alias plus the ORM behaviour switches.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{AppConfig, DatabaseConfig, OrmConfig};
//!
//! let db_config = DatabaseConfig::new(
//!     "localhost".to_string(), 5432, "myapp".to_string(),
//!     "postgres".to_string(), "password".to_string(),
//!     1, 10, 30, 600, 3600,
//! );
//!
//! let config = AppConfig::single(db_config, OrmConfig::default());
//! assert!(config.connections.contains_key("default"));
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [connections.default]
//! host = "localhost"
//! port = 5432
//! database = "myapp"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//!
//! [connections.reporting]
//! host = "replica.internal"
//! # ...
//!
//! [orm]
//! auto_create_tables = true
//! default_connection = "default"
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from rowhaus.toml (or the path in ROWHAUS_CONFIG)
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./rowhaus.toml";
const CONFIG_ENV_VAR: &str = "ROWHAUS_CONFIG";
pub const DEFAULT_CONNECTION: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Named connection aliases
    pub connections: HashMap<String, DatabaseConfig>,
    #[serde(default)]
    pub orm: OrmConfig,
}

/// Database configuration for one connection alias
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// ORM behaviour switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrmConfig {
    /// Create a missing table (when its model declares a schema) and retry once
    #[serde(default = "default_auto_create_tables")]
    pub auto_create_tables: bool,
    /// Alias used by models that don't name a connection
    #[serde(default = "default_connection_name")]
    pub default_connection: String,
}

fn default_auto_create_tables() -> bool {
    true
}

fn default_connection_name() -> String {
    DEFAULT_CONNECTION.to_string()
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            auto_create_tables: default_auto_create_tables(),
            default_connection: default_connection_name(),
        }
    }
}

impl AppConfig {
    /// Configuration with a single connection registered under `default`
    pub fn single(database: DatabaseConfig, orm: OrmConfig) -> Self {
        let mut connections = HashMap::new();
        connections.insert(DEFAULT_CONNECTION.to_string(), database);
        Self { connections, orm }
    }

    /// Load configuration from the TOML file named in .env or the default path
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine; a malformed one is not
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let config = if let Ok(config_path) = env::var(CONFIG_ENV_VAR) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH
            )))
        }?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a connection alias
    pub fn connection(&self, alias: &str) -> Option<&DatabaseConfig> {
        self.connections.get(alias)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connections.is_empty() {
            return Err(ConfigError::Invalid(
                "At least one connection must be configured".to_string(),
            ));
        }
        if self.orm.default_connection.is_empty() {
            return Err(ConfigError::Invalid(
                "Default connection name cannot be empty".to_string(),
            ));
        }

        for (alias, database) in &self.connections {
            database
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("connection '{}': {}", alias, e)))?;
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        min_connections: u32,
        max_connections: u32,
        connection_timeout_seconds: u64,
        idle_timeout_seconds: u64,
        max_lifetime_seconds: u64,
    ) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            min_connections,
            max_connections,
            connection_timeout_seconds,
            idle_timeout_seconds,
            max_lifetime_seconds,
        }
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Database host cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("Database port cannot be zero".to_string());
        }
        if self.database.is_empty() {
            return Err("Database name cannot be empty".to_string());
        }
        if self.username.is_empty() {
            return Err("Database username cannot be empty".to_string());
        }
        if self.min_connections == 0 {
            return Err("Database min_connections must be greater than 0".to_string());
        }
        if self.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.min_connections > self.max_connections {
            return Err(
                "Database min_connections cannot be greater than max_connections".to_string(),
            );
        }
        if self.connection_timeout_seconds == 0 {
            return Err("Database connection_timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}
