//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Maximum time a command waits for an account row lock, in milliseconds.
    ///
    /// `0` means wait indefinitely.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// How long operation log rows are kept before cleanup, in hours.
    #[serde(default = "default_operation_log_retention_hours")]
    pub operation_log_retention_hours: u32,
    /// Name of the system category used for credit-card invoice payments.
    #[serde(default = "default_invoice_category_name")]
    pub invoice_category_name: String,
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_operation_log_retention_hours() -> u32 {
    168 // 7 days
}

fn default_invoice_category_name() -> String {
    "Pagamento de Fatura".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            operation_log_retention_hours: default_operation_log_retention_hours(),
            invoice_category_name: default_invoice_category_name(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CAIXA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
