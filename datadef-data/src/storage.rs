use std::future::{ready, Future};

use datadef_core::{DataError, DataResult, EntityId};

use crate::query::RecordQuery;
use crate::record::{RecordType, StoredRecord};

/// Access mode of a storage session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    ReadOnly,
    ReadWrite,
}

impl SessionMode {
    pub fn is_read_only(self) -> bool {
        self == SessionMode::ReadOnly
    }

    /// Fail with [`DataError::ReadOnlySession`] unless writes are allowed.
    pub fn require_write(self, operation: &'static str) -> DataResult<()> {
        match self {
            SessionMode::ReadWrite => Ok(()),
            SessionMode::ReadOnly => Err(DataError::ReadOnlySession(operation)),
        }
    }
}

/// A relational storage engine able to open transactional sessions.
///
/// Uses RPITIT (return-position `impl Trait` in traits), so backends
/// implement plain `async fn`s.
pub trait Storage: Send + Sync {
    type Session: StorageSession;

    fn begin(&self, mode: SessionMode) -> impl Future<Output = DataResult<Self::Session>> + Send;
}

/// One transaction against a [`Storage`].
///
/// Dropping a session without calling [`commit`](StorageSession::commit)
/// rolls it back. Mutations on a [`SessionMode::ReadOnly`] session fail
/// with [`DataError::ReadOnlySession`].
pub trait StorageSession: Send {
    fn mode(&self) -> SessionMode;

    /// Records matching the query, in query order and within its paging.
    fn fetch(
        &mut self,
        query: &RecordQuery,
    ) -> impl Future<Output = DataResult<Vec<StoredRecord>>> + Send;

    /// Number of records matching the query's conditions, ignoring order
    /// and paging.
    fn count(&mut self, query: &RecordQuery) -> impl Future<Output = DataResult<u64>> + Send;

    /// Insert a live record and return its generated id.
    ///
    /// Backends without write support keep the default, which fails with
    /// [`DataError::NotImplemented`]. The same holds for `update` and
    /// `mark_deleted`.
    fn insert(
        &mut self,
        _record_type: &RecordType,
        _values: &StoredRecord,
    ) -> impl Future<Output = DataResult<EntityId>> + Send {
        ready(Err(DataError::NotImplemented("insert")))
    }

    /// Update columns of the live record `id`; returns the affected row count.
    fn update(
        &mut self,
        _record_type: &RecordType,
        _id: EntityId,
        _values: &StoredRecord,
    ) -> impl Future<Output = DataResult<u64>> + Send {
        ready(Err(DataError::NotImplemented("update")))
    }

    /// Set the deletion marker of the live record `id`; returns the affected
    /// row count, 0 when it was already deleted or never existed.
    fn mark_deleted(
        &mut self,
        _record_type: &RecordType,
        _id: EntityId,
    ) -> impl Future<Output = DataResult<u64>> + Send {
        ready(Err(DataError::NotImplemented("mark_deleted")))
    }

    fn commit(self) -> impl Future<Output = DataResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = DataResult<()>> + Send;
}
