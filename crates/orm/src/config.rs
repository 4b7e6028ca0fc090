//! Database configuration loaded from the environment

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::error::ModelError;

/// Connection settings for the gateway pool
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout: u64,
    /// Seconds a connection may sit idle, `None` keeps it forever
    pub idle_timeout: Option<u64>,
    /// Seconds before a connection is recycled, `None` keeps it forever
    pub max_lifetime: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mysql://localhost:3306/app".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600),  // 10 minutes
            max_lifetime: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for the given URL with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = get_env_required("DATABASE_URL")?;
        let max_connections = parse_env("DB_MAX_CONNECTIONS", "10", "positive integer")?;
        let min_connections = parse_env("DB_MIN_CONNECTIONS", "1", "non-negative integer")?;
        let acquire_timeout = parse_env("DB_ACQUIRE_TIMEOUT", "30", "seconds")?;
        let idle_timeout: u64 = parse_env("DB_IDLE_TIMEOUT", "600", "seconds (0 disables)")?;
        let max_lifetime: u64 = parse_env("DB_MAX_LIFETIME", "1800", "seconds (0 disables)")?;
        let test_before_acquire = parse_env("DB_TEST_BEFORE_ACQUIRE", "true", "true or false")?;

        let config = Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout,
            idle_timeout: (idle_timeout > 0).then_some(idle_timeout),
            max_lifetime: (max_lifetime > 0).then_some(max_lifetime),
            test_before_acquire,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "url".to_string(),
                reason: "Database URL cannot be empty".to_string(),
            });
        }

        if !self.url.starts_with("mysql://") {
            return Err(ConfigError::ValidationFailed {
                field: "url".to_string(),
                reason: "Only mysql:// URLs are supported".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max_connections".to_string(),
                reason: "Pool needs at least one connection".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationFailed {
                field: "min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }

    pub fn acquire_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }

    /// URL with credentials stripped, safe for logs
    pub fn redacted_url(&self) -> &str {
        self.url.rsplit('@').next().unwrap_or("unknown")
    }
}

fn get_env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar {
        var: key.to_string(),
    })
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &str, default: &str, expected: &str) -> Result<T, ConfigError> {
    let raw = get_env_or_default(key, default);
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        field: key.to_string(),
        value: raw.clone(),
        expected: expected.to_string(),
    })
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}
