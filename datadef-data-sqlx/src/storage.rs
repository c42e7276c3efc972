use std::str::FromStr;

use datadef_core::{DataResult, DataSourceConfig};
use datadef_data::{Dialect, QueryBuilder, SessionMode, Storage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::SqlxResultExt;
use crate::tx::SqlxSession;

/// A [`Storage`] over an SQLx SQLite pool.
///
/// # Example
///
/// ```ignore
/// let storage = SqlxStorage::connect(&config.section::<DataSourceConfig>()?).await?;
/// let service = DataAccessService::new(schemas, record_types, storage);
/// ```
#[derive(Debug, Clone)]
pub struct SqlxStorage {
    pool: SqlitePool,
    builder: QueryBuilder,
}

impl SqlxStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            builder: QueryBuilder::new(Dialect::Sqlite),
        }
    }

    /// Open a pool as described by a `datadef.datasource` section.
    pub async fn connect(config: &DataSourceConfig) -> DataResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .data_err()?
            .create_if_missing(config.create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .data_err()?;
        tracing::info!(url = %config.url, max_connections = config.max_connections, "connected to SQLite");
        Ok(Self::new(pool))
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Storage for SqlxStorage {
    type Session = SqlxSession;

    async fn begin(&self, mode: SessionMode) -> DataResult<SqlxSession> {
        let tx = self.pool.begin().await.data_err()?;
        Ok(SqlxSession::new(tx, mode, self.builder))
    }
}
