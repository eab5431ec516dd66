//! Harness configuration management.
//!
//! Provides typed configuration loaded from environment variables with validation.

use std::path::PathBuf;

use crate::migration::RollbackOrder;

/// Harness configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// SQLite database URL (a file path) used for database assertions
    pub database_url: Option<String>,

    /// Origin used to resolve relative `Location` headers
    pub base_url: String,

    /// Redirect-following settings
    pub redirect: RedirectConfig,

    /// Migration and rollback settings
    pub migration: MigrationConfig,

    /// Database connection pool settings
    pub pool: PoolConfig,
}

/// Redirect-following configuration.
#[derive(Debug, Clone)]
pub struct RedirectConfig {
    /// Maximum hops to follow; `None` disables following
    pub max_hops: Option<u32>,

    /// Fail the request when the hop cap is reached on a redirect
    pub raise_on_exceed: bool,
}

/// Migration runner configuration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Command prefix used for rollback; `None` makes rollback a no-op
    pub rollback_command: Option<String>,

    /// Directory holding the per-migration rollback scripts
    pub bin_dir: PathBuf,

    /// Order in which migration units are rolled back
    pub rollback_order: RollbackOrder,
}

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            max_hops: None,
            raise_on_exceed: true,
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            rollback_command: None,
            bin_dir: PathBuf::from("bin"),
            rollback_order: RollbackOrder::Declared,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_size: 4 }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            base_url: "http://localhost".to_string(),
            redirect: RedirectConfig::default(),
            migration: MigrationConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

/// Configuration loading error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configuration error for '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ConfigError {}

impl HarnessConfig {
    /// Load configuration from a `.env` file (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `HARNESS_DATABASE_URL`: SQLite database path
    /// - `HARNESS_BASE_URL`: Origin for resolving redirects (default: http://localhost)
    /// - `HARNESS_MAX_REDIRECTS`: Hop cap; unset disables redirect following
    /// - `HARNESS_RAISE_ON_REDIRECT_LIMIT`: Fail when the cap is hit (default: 1)
    /// - `HARNESS_ROLLBACK_COMMAND`: Rollback command prefix (default: none)
    /// - `HARNESS_BIN_DIR`: Rollback script directory (default: bin)
    /// - `HARNESS_ROLLBACK_ORDER`: `declared` or `reverse` (default: declared)
    /// - `HARNESS_POOL_MAX_SIZE`: Max pool connections (default: 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let redirect = RedirectConfig {
            max_hops: parse_env_opt("HARNESS_MAX_REDIRECTS")?,
            raise_on_exceed: parse_env_or("HARNESS_RAISE_ON_REDIRECT_LIMIT", 1)? != 0,
        };

        let migration = MigrationConfig {
            rollback_command: std::env::var("HARNESS_ROLLBACK_COMMAND").ok(),
            bin_dir: std::env::var("HARNESS_BIN_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.migration.bin_dir),
            rollback_order: match std::env::var("HARNESS_ROLLBACK_ORDER") {
                Ok(val) => val.parse().map_err(|message| ConfigError {
                    field: "HARNESS_ROLLBACK_ORDER".to_string(),
                    message,
                })?,
                Err(_) => defaults.migration.rollback_order,
            },
        };

        let config = Self {
            database_url: std::env::var("HARNESS_DATABASE_URL").ok(),
            base_url: std::env::var("HARNESS_BASE_URL").unwrap_or(defaults.base_url),
            redirect,
            migration,
            pool: PoolConfig {
                max_size: parse_env_or("HARNESS_POOL_MAX_SIZE", defaults.pool.max_size)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError {
                field: "HARNESS_BASE_URL".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError {
                field: "HARNESS_BASE_URL".to_string(),
                message: format!("'{}' is not a valid URL", self.base_url),
            });
        }

        if let Some(database_url) = &self.database_url {
            if database_url.is_empty() {
                return Err(ConfigError {
                    field: "HARNESS_DATABASE_URL".to_string(),
                    message: "Cannot be empty".to_string(),
                });
            }
        }

        if self.pool.max_size == 0 {
            return Err(ConfigError {
                field: "HARNESS_POOL_MAX_SIZE".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Parse an environment variable or return a default value.
fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    Ok(parse_env_opt(name)?.unwrap_or(default))
}

/// Parse an optional environment variable; unset means `None`.
fn parse_env_opt<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(val) => val.parse().map(Some).map_err(|_| ConfigError {
            field: name.to_string(),
            message: format!("Invalid value '{}', expected a valid number", val),
        }),
        Err(_) => Ok(None),
    }
}
