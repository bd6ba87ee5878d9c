//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub billing: BillingConfig,
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Billing-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// Currency label used in human-readable notifications
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Prefix for generated student codes
    #[serde(default = "default_student_prefix")]
    pub student_code_prefix: String,

    /// Months of history shown in the dashboard chart
    #[serde(default = "default_chart_months")]
    pub chart_months: u32,
}

fn default_currency() -> String {
    "BDT".to_string()
}

fn default_student_prefix() -> String {
    "STU".to_string()
}

fn default_chart_months() -> u32 {
    12
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        // Pick up a local .env before reading the environment.
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("billing.currency", "BDT")?
            .set_default("billing.student_code_prefix", "STU")?
            .set_default("billing.chart_months", 12)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with HOSTEL_ prefix
            .add_source(
                Environment::with_prefix("HOSTEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("HOSTEL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            student_code_prefix: default_student_prefix(),
            chart_months: default_chart_months(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_billing_config() {
        let config = BillingConfig::default();
        assert_eq!(config.currency, "BDT");
        assert_eq!(config.student_code_prefix, "STU");
        assert_eq!(config.chart_months, 12);
    }
}
