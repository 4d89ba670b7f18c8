//! Configuration management for the TrackIt inventory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with TRACKIT_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Signing key shipped in config/development.toml
const DEVELOPMENT_SECRET: &str = "development-secret-key";

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Inventory tuning
    pub inventory: InventoryConfig,
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

    /// Apply pending migrations at start-up outside development
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying HS256 bearer tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Random draws before product code generation gives up
    pub max_code_attempts: u32,

    /// Upper bound on ledger rows returned by one query
    pub ledger_page_limit: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("TRACKIT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", false)?
            .set_default(
                "inventory.max_code_attempts",
                i64::from(shared::MAX_CODE_ATTEMPTS),
            )?
            .set_default("inventory.ledger_page_limit", 100)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (TRACKIT_ prefix)
            .add_source(
                Environment::with_prefix("TRACKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Whether start-up should apply pending migrations
    pub fn should_run_migrations(&self) -> bool {
        self.environment == "development" || self.database.run_migrations
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(AppError::Configuration("jwt.secret must be set".to_string()));
        }
        if self.environment == "production" && self.jwt.secret == DEVELOPMENT_SECRET {
            return Err(AppError::Configuration(
                "jwt.secret still holds the development key".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Configuration(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        if self.inventory.max_code_attempts == 0 {
            return Err(AppError::Configuration(
                "inventory.max_code_attempts must be at least 1".to_string(),
            ));
        }
        if self.inventory.ledger_page_limit < 1 {
            return Err(AppError::Configuration(
                "inventory.ledger_page_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
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

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: shared::MAX_CODE_ATTEMPTS,
            ledger_page_limit: 100,
        }
    }
}
