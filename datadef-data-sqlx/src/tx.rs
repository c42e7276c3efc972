//! Transaction-scoped storage sessions.
//!
//! A [`SqlxSession`] owns one SQLx [`Transaction`]:
//! - begun by [`SqlxStorage::begin`](crate::SqlxStorage)
//! - committed by [`StorageSession::commit`]
//! - rolled back by [`StorageSession::rollback`] or on drop

use datadef_core::{DataResult, EntityId};
use datadef_data::{
    QueryBuilder, RecordQuery, RecordType, SessionMode, SqlStatement, StorageSession, StoredRecord,
};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::decode::{bind_params, decode_row};
use crate::error::SqlxResultExt;

pub struct SqlxSession {
    tx: Transaction<'static, Sqlite>,
    mode: SessionMode,
    builder: QueryBuilder,
}

impl SqlxSession {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, mode: SessionMode, builder: QueryBuilder) -> Self {
        Self { tx, mode, builder }
    }

    /// Returns a mutable reference to the underlying connection.
    pub fn as_mut(&mut self) -> &mut sqlx::SqliteConnection {
        &mut self.tx
    }

    async fn execute(&mut self, stmt: SqlStatement) -> DataResult<u64> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "executing statement");
        let result = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&mut *self.tx)
            .await
            .data_err()?;
        Ok(result.rows_affected())
    }
}

impl StorageSession for SqlxSession {
    fn mode(&self) -> SessionMode {
        self.mode
    }

    async fn fetch(&mut self, query: &RecordQuery) -> DataResult<Vec<StoredRecord>> {
        let stmt = self.builder.select(query)?;
        debug!(sql = %stmt.sql, params = stmt.params.len(), "fetching records");
        let rows = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_all(&mut *self.tx)
            .await
            .data_err()?;
        rows.iter().map(decode_row).collect()
    }

    async fn count(&mut self, query: &RecordQuery) -> DataResult<u64> {
        let stmt = self.builder.count(query)?;
        debug!(sql = %stmt.sql, params = stmt.params.len(), "counting records");
        let row = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_one(&mut *self.tx)
            .await
            .data_err()?;
        let count: i64 = row.try_get(0).data_err()?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert(&mut self, record_type: &RecordType, values: &StoredRecord) -> DataResult<EntityId> {
        self.mode.require_write("insert")?;
        let stmt = self.builder.insert(record_type, values)?;
        debug!(sql = %stmt.sql, params = stmt.params.len(), "inserting record");
        let result = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&mut *self.tx)
            .await
            .data_err()?;
        Ok(EntityId::new(result.last_insert_rowid()))
    }

    async fn update(
        &mut self,
        record_type: &RecordType,
        id: EntityId,
        values: &StoredRecord,
    ) -> DataResult<u64> {
        self.mode.require_write("update")?;
        let stmt = self.builder.update(record_type, id, values)?;
        self.execute(stmt).await
    }

    async fn mark_deleted(&mut self, record_type: &RecordType, id: EntityId) -> DataResult<u64> {
        self.mode.require_write("mark_deleted")?;
        let stmt = self.builder.mark_deleted(record_type, id)?;
        self.execute(stmt).await
    }

    async fn commit(self) -> DataResult<()> {
        self.tx.commit().await.data_err()
    }

    async fn rollback(self) -> DataResult<()> {
        self.tx.rollback().await.data_err()
    }
}
