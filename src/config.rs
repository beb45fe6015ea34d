//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Signing secret used when none is configured outside production
const DEVELOPMENT_JWT_SECRET: &str = "shop-ledger-development-secret";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime
    pub jwt_expiration_hours: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://shop.db?mode=rwc".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "production" => return Err(ConfigError::MissingEnv("JWT_SECRET")),
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
        };

        let jwt_expiration_hours: i64 = env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("JWT_EXPIRATION_HOURS"))?;

        if jwt_expiration_hours <= 0 {
            return Err(ConfigError::InvalidValue("JWT_EXPIRATION_HOURS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret,
            jwt_expiration_hours,
        })
    }

    /// Configuration for tests and tools: in-memory database, fixed secret
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_for_tests() {
        let config = Config::for_tests();
        assert!(!config.is_production());
        assert_eq!(config.database_max_connections, 1);
    }
}
