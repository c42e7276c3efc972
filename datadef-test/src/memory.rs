//! An in-memory [`Storage`] with transactional sessions.
//!
//! Read-only sessions work on a snapshot taken at `begin`. Read-write
//! sessions hold the write lock for their whole lifetime and edit a working
//! copy that replaces the shared state on commit, so a dropped or rolled
//! back session leaves no trace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use datadef_core::{DataError, DataResult, EntityId, FieldValue};
use datadef_data::filter::is_live;
use datadef_data::{RecordQuery, RecordType, SessionMode, Storage, StorageSession, StoredRecord};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, Clone, Default)]
struct Tables {
    rows: HashMap<String, Vec<StoredRecord>>,
}

impl Tables {
    fn table(&self, name: &str) -> &[StoredRecord] {
        self.rows.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    fn next_id(&self, record_type: &RecordType) -> i64 {
        self.table(record_type.table())
            .iter()
            .filter_map(|r| r.get(record_type.id_column()).and_then(FieldValue::as_i64))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn live_mut<'a>(
        &'a mut self,
        record_type: &RecordType,
        id: EntityId,
    ) -> Option<&'a mut StoredRecord> {
        self.rows
            .get_mut(record_type.table())?
            .iter_mut()
            .find(|r| {
                r.get(record_type.id_column()).and_then(FieldValue::as_i64) == Some(id.get())
                    && is_live(r, record_type)
            })
    }
}

/// Shared in-memory tables keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<Tables>>,
    sessions_started: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw record as-is, bypassing every check. Seeded records may
    /// hold values of any type, e.g. to simulate corrupt storage.
    pub async fn seed(&self, table: &str, record: StoredRecord) {
        self.state
            .write()
            .await
            .rows
            .entry(table.to_string())
            .or_default()
            .push(record);
    }

    /// Raw contents of a table, soft-deleted records included.
    pub async fn rows(&self, table: &str) -> Vec<StoredRecord> {
        self.state.read().await.table(table).to_vec()
    }

    /// Number of sessions opened so far.
    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }
}

impl Storage for MemoryStorage {
    type Session = MemorySession;

    async fn begin(&self, mode: SessionMode) -> DataResult<MemorySession> {
        self.sessions_started.fetch_add(1, Ordering::SeqCst);
        let state = match mode {
            SessionMode::ReadOnly => SessionState::Snapshot(Tables::clone(&*self.state.read().await)),
            SessionMode::ReadWrite => {
                let guard = self.state.clone().write_owned().await;
                let working = Tables::clone(&guard);
                SessionState::Locked { guard, working }
            }
        };
        tracing::trace!(?mode, "memory session started");
        Ok(MemorySession { mode, state })
    }
}

enum SessionState {
    Snapshot(Tables),
    Locked {
        guard: OwnedRwLockWriteGuard<Tables>,
        working: Tables,
    },
}

pub struct MemorySession {
    mode: SessionMode,
    state: SessionState,
}

impl MemorySession {
    fn tables(&self) -> &Tables {
        match &self.state {
            SessionState::Snapshot(tables) => tables,
            SessionState::Locked { working, .. } => working,
        }
    }

    fn tables_mut(&mut self, operation: &'static str) -> DataResult<&mut Tables> {
        self.mode.require_write(operation)?;
        match &mut self.state {
            SessionState::Locked { working, .. } => Ok(working),
            SessionState::Snapshot(_) => Err(DataError::ReadOnlySession(operation)),
        }
    }

    fn matching(&self, query: &RecordQuery) -> Vec<&StoredRecord> {
        self.tables()
            .table(query.record_type().table())
            .iter()
            .filter(|r| query.matches(r))
            .collect()
    }
}

impl StorageSession for MemorySession {
    fn mode(&self) -> SessionMode {
        self.mode
    }

    async fn fetch(&mut self, query: &RecordQuery) -> DataResult<Vec<StoredRecord>> {
        let mut rows = self.matching(query);
        rows.sort_by(|a, b| query.compare(a, b));
        let offset = usize::try_from(query.offset_value().unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit_value()
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&mut self, query: &RecordQuery) -> DataResult<u64> {
        Ok(self.matching(query).len() as u64)
    }

    async fn insert(&mut self, record_type: &RecordType, values: &StoredRecord) -> DataResult<EntityId> {
        let tables = self.tables_mut("insert")?;
        let id = tables.next_id(record_type);
        let mut record = StoredRecord::new().with(record_type.id_column(), id);
        for (column, value) in values.iter() {
            record.set(column, value.clone());
        }
        record.set(record_type.deleted_column(), false);
        tables
            .rows
            .entry(record_type.table().to_string())
            .or_default()
            .push(record);
        Ok(EntityId::new(id))
    }

    async fn update(
        &mut self,
        record_type: &RecordType,
        id: EntityId,
        values: &StoredRecord,
    ) -> DataResult<u64> {
        let tables = self.tables_mut("update")?;
        match tables.live_mut(record_type, id) {
            Some(record) => {
                for (column, value) in values.iter() {
                    record.set(column, value.clone());
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn mark_deleted(&mut self, record_type: &RecordType, id: EntityId) -> DataResult<u64> {
        let tables = self.tables_mut("mark_deleted")?;
        match tables.live_mut(record_type, id) {
            Some(record) => {
                record.set(record_type.deleted_column(), true);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn commit(self) -> DataResult<()> {
        if let SessionState::Locked { mut guard, working } = self.state {
            *guard = working;
        }
        Ok(())
    }

    async fn rollback(self) -> DataResult<()> {
        Ok(())
    }
}
