//! Configuration management for the Milk Quality Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with MQ_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{StalePolicy, DEFAULT_KG_PER_LITRE};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Line event handling on transaction documents
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Milk density and UOM naming
    #[serde(default)]
    pub milk: MilkConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    /// What to do with lookup results that arrive after a newer lookup
    pub stale_policy: StalePolicy,

    /// Delay the form waits before clearing a rejected UOM
    pub uom_clear_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MilkConfig {
    /// Kilograms of raw milk per litre
    pub kg_per_litre: Decimal,

    /// UOM the milk ledger reports volumes in
    pub litre_uom: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("MQ_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("documents.stale_policy", "last_write_wins")?
            .set_default("documents.uom_clear_delay_ms", 500)?
            .set_default("milk.kg_per_litre", DEFAULT_KG_PER_LITRE.to_string())?
            .set_default("milk.litre_uom", "Litre")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MQ_ prefix)
            .add_source(
                Environment::with_prefix("MQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                min_connections: 2,
            },
            documents: DocumentsConfig::default(),
            milk: MilkConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            stale_policy: StalePolicy::LastWriteWins,
            uom_clear_delay_ms: 500,
        }
    }
}

impl Default for MilkConfig {
    fn default() -> Self {
        Self {
            kg_per_litre: DEFAULT_KG_PER_LITRE,
            litre_uom: "Litre".to_string(),
        }
    }
}
