//! Application configuration.
//!
//! Loaded from an optional `config.toml` in the working directory, then
//! overridden by `REALTY_`-prefixed environment variables using `__` as the
//! section separator, e.g. `REALTY_DATABASE__PATH=/var/lib/realty.sqlite3`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub commission: CommissionConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            max_workers: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub schema_path: String,
    /// SQLite busy timeout applied to every connection.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "realty.sqlite3".to_string(),
            schema_path: "sql/schema.sql".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

/// Commission policy. Amounts are minor currency units, rates basis points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionConfig {
    pub min_transaction_amount: i64,
    pub max_transaction_amount: i64,
    pub sale_default_rate: u32,
    pub rental_default_rate: u32,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            // 10.00
            min_transaction_amount: 1_000,
            // 1,000,000,000.00
            max_transaction_amount: 100_000_000_000,
            sale_default_rate: 800,
            rental_default_rate: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("REALTY").separator("__"))
            .build()?
            .try_deserialize()
    }
}
