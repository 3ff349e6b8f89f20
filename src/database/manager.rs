use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Schema bootstrap failed: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Tables owned by this service. Safe to run on every start.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS todos (
        id      UUID PRIMARY KEY,
        todo    TEXT NOT NULL CHECK (length(btrim(todo)) > 0),
        is_done BOOLEAN NOT NULL DEFAULT FALSE,
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id       UUID PRIMARY KEY,
        email    TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        avatar   TEXT NOT NULL DEFAULT '',
        created  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Builds the PostgreSQL pool the stores run on
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool using the configured URL and limits
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database at {}", Self::redact_url(url)?);
        Ok(pool)
    }

    /// Create the service tables if they are missing
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(pool: &PgPool) {
        pool.close().await;
        info!("Closed database pool");
    }

    /// Strip credentials from a connection string before it is logged
    fn redact_url(raw: &str) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if url.password().is_some() {
            url.set_password(Some("redacted"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(url.into())
    }
}
