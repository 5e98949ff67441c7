use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::database::store::Store;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors from the store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Timed out waiting for a database connection")]
    PoolTimedOut,

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::PoolTimedOut = err {
            return DatabaseError::PoolTimedOut;
        }

        let classified = err.as_database_error().and_then(|db_err| {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Some(DatabaseError::UniqueViolation(constraint)),
                Some(FOREIGN_KEY_VIOLATION) => Some(DatabaseError::ForeignKeyViolation(constraint)),
                _ => None,
            }
        });

        classified.unwrap_or(DatabaseError::Sqlx(err))
    }
}

/// Builds the connection pool and the store that owns it
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connection options from `url` when set, otherwise from the discrete fields
    pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DatabaseError> {
        match &config.url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string())),
            None => Ok(PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&config.name)),
        }
    }

    /// Bounded pool; acquisitions queue up to `acquire_timeout_secs`
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        info!(
            "Created database pool for {} (max_connections={})",
            config.name, config.max_connections
        );
        Ok(pool)
    }

    /// Opens the configured store, applying the schema when `auto_migrate` is set
    pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, DatabaseError> {
        let store: Arc<dyn Store> = if config.is_memory() {
            info!("Using in-process store; data is discarded on shutdown");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(PgStore::new(Self::connect(config).await?))
        };

        if config.auto_migrate {
            store.migrate().await?;
        }

        Ok(store)
    }
}
