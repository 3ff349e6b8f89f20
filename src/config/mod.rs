use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

// Range accepted by the bcrypt crate
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365 * 10;

/// Environment variables read on top of the profile defaults. Later keys win,
/// so `TODO_API_PORT` beats `PORT` and `TODO_API_STORE` beats `DATABASE_URL`.
const OVERRIDE_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "TODO_API_PORT",
    "DATABASE_URL",
    "TODO_API_STORE",
    "DATABASE_MAX_CONNECTIONS",
    "DATABASE_CONNECTION_TIMEOUT",
    "API_ENABLE_REQUEST_LOGGING",
    "API_MAX_REQUEST_SIZE_BYTES",
    "SECURITY_ENABLE_CORS",
    "SECURITY_CORS_ORIGINS",
    "JWT_SECRET",
    "SECURITY_JWT_EXPIRY_HOURS",
    "BCRYPT_COST",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which Persistence Handle implementation backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}' (expected postgres or memory)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        for key in OVERRIDE_KEYS {
            if let Ok(value) = env::var(key) {
                if let Err(e) = self.apply_override(key, &value) {
                    tracing::warn!("Ignoring {}: {}", key, e);
                }
            }
        }
        self
    }

    /// Apply one environment override. On error the field keeps its previous value.
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            // Server
            "HOST" => self.server.host = value.to_string(),
            "PORT" | "TODO_API_PORT" => self.server.port = parse_value(value)?,

            // Database
            "DATABASE_URL" => {
                if !value.trim().is_empty() {
                    self.database.url = Some(value.to_string());
                    self.database.backend = StoreBackend::Postgres;
                }
            }
            "TODO_API_STORE" => self.database.backend = parse_value(value)?,
            "DATABASE_MAX_CONNECTIONS" => self.database.max_connections = parse_value(value)?,
            "DATABASE_CONNECTION_TIMEOUT" => self.database.connection_timeout = parse_value(value)?,

            // API
            "API_ENABLE_REQUEST_LOGGING" => self.api.enable_request_logging = parse_value(value)?,
            "API_MAX_REQUEST_SIZE_BYTES" => self.api.max_request_size_bytes = parse_value(value)?,

            // Security
            "SECURITY_ENABLE_CORS" => self.security.enable_cors = parse_value(value)?,
            "SECURITY_CORS_ORIGINS" => {
                self.security.cors_origins = value.split(',').map(|s| s.trim().to_string()).collect();
            }
            "JWT_SECRET" => self.security.jwt_secret = value.to_string(),
            "SECURITY_JWT_EXPIRY_HOURS" => self.security.jwt_expiry_hours = parse_value(value)?,
            "BCRYPT_COST" => self.security.bcrypt_cost = parse_value(value)?,

            other => return Err(format!("unknown setting {}", other)),
        }
        Ok(())
    }

    /// Checks that must pass before the server binds a socket
    pub fn validate(&self) -> Result<(), String> {
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err("DATABASE_URL must be set when using the postgres store".to_string());
        }
        if self.environment != Environment::Development && self.security.jwt_secret.is_empty() {
            return Err(format!("JWT_SECRET must be set in {:?}", self.environment));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.security.bcrypt_cost) {
            return Err(format!(
                "BCRYPT_COST must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            ));
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(format!(
                "SECURITY_JWT_EXPIRY_HOURS must be between 1 and {}",
                MAX_JWT_EXPIRY_HOURS
            ));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 10,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                bcrypt_cost: 12,
            },
        }
    }
}

fn parse_value<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| format!("invalid value {:?}: {}", value, e))
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.server.port, 5000);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.security.jwt_expiry_hours, 4);
        // No secret and no database url until the environment provides them
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_requires_jwt_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/todo".to_string());
        assert!(config.validate().unwrap_err().contains("JWT_SECRET"));

        config.security.jwt_secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_bcrypt_cost() {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 2;
        assert!(config.validate().unwrap_err().contains("BCRYPT_COST"));
    }

    #[test]
    fn rejects_out_of_range_jwt_expiry() {
        let mut config = AppConfig::development();
        for hours in [0, MAX_JWT_EXPIRY_HOURS + 1, 10_000_000_000] {
            config.security.jwt_expiry_hours = hours;
            assert!(config.validate().unwrap_err().contains("SECURITY_JWT_EXPIRY_HOURS"));
        }

        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_store_override_is_reported_and_ignored() {
        let mut config = AppConfig::development();
        let err = config.apply_override("TODO_API_STORE", "mongo").unwrap_err();
        assert!(err.contains("mongo"));
        assert_eq!(config.database.backend, StoreBackend::Memory);

        config.apply_override("TODO_API_STORE", "postgres").unwrap();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
    }

    #[test]
    fn malformed_numeric_override_keeps_previous_value() {
        let mut config = AppConfig::development();
        assert!(config.apply_override("TODO_API_PORT", "eighty").is_err());
        assert_eq!(config.server.port, 5000);

        config.apply_override("TODO_API_PORT", " 8080 ").unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn database_url_override_selects_postgres() {
        let mut config = AppConfig::development();
        config.apply_override("DATABASE_URL", "   ").unwrap();
        assert_eq!(config.database.backend, StoreBackend::Memory);

        config.apply_override("DATABASE_URL", "postgres://localhost/todo").unwrap();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/todo"));
    }

    #[test]
    fn parses_store_backend() {
        assert_eq!("postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("MEMORY".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }
}
