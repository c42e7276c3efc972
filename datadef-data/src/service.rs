//! The caller-facing facade: `get`, `delete`, `find` and `save` by kind name.
//!
//! Every operation resolves the definition and its record type before
//! opening a storage session, so unknown kinds and virtual tables fail
//! without touching storage. Operations that read or write fields also
//! bind the field access table first, rejecting custom fields the same
//! way. Each operation then uses exactly one session, awaiting its
//! round-trips in sequence.

use std::sync::Arc;

use datadef_core::{
    AccessConfig, DataDefinition, DataError, DataResult, EntityId, EntityKind, GenericEntity,
    SchemaRegistry,
};
use tracing::debug;

use crate::accessor::FieldAccessTable;
use crate::criteria::SearchCriteria;
use crate::mapper::{EntityMapper, WriteMode};
use crate::page::ResultPage;
use crate::query::RecordQuery;
use crate::record::{RecordType, RecordTypeResolver};
use crate::storage::{SessionMode, Storage, StorageSession};

pub struct DataAccessService<S> {
    schemas: Arc<dyn SchemaRegistry>,
    record_types: Arc<dyn RecordTypeResolver>,
    storage: S,
    max_page_size: u64,
}

impl<S> std::fmt::Debug for DataAccessService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccessService")
            .field("max_page_size", &self.max_page_size)
            .finish_non_exhaustive()
    }
}

impl<S: Storage> DataAccessService<S> {
    pub fn new(
        schemas: impl SchemaRegistry + 'static,
        record_types: impl RecordTypeResolver + 'static,
        storage: S,
    ) -> Self {
        Self {
            schemas: Arc::new(schemas),
            record_types: Arc::new(record_types),
            storage,
            max_page_size: AccessConfig::default().max_page_size,
        }
    }

    /// Apply the limits of an [`AccessConfig`] section.
    pub fn with_access_config(mut self, config: &AccessConfig) -> Self {
        self.max_page_size = config.max_page_size;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The live entity with the given id, or `None` when it does not exist
    /// or has been soft-deleted.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, kind: &str, id: EntityId) -> DataResult<Option<GenericEntity>> {
        let (definition, record_type) = self.resolve(kind)?;
        let table = FieldAccessTable::bind(&definition, &record_type)?;

        let mut session = self.storage.begin(SessionMode::ReadOnly).await?;
        let rows = session
            .fetch(&RecordQuery::by_id(record_type.clone(), id))
            .await?;
        session.rollback().await?;

        let mapper = EntityMapper::new(&table);
        rows.first().map(|row| mapper.to_generic(row)).transpose()
    }

    /// Soft-delete the entity. Deleting a missing or already deleted entity
    /// succeeds without effect.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete(&self, kind: &str, id: EntityId) -> DataResult<()> {
        // Only the marker is written, so custom fields do not matter here.
        let (_, record_type) = self.resolve(kind)?;

        let mut session = self.storage.begin(SessionMode::ReadWrite).await?;
        let affected = session.mark_deleted(&record_type, id).await?;
        session.commit().await?;

        if affected == 0 {
            debug!(%id, "no live record to delete");
        } else {
            debug!(%id, "record soft-deleted");
        }
        Ok(())
    }

    /// One page of the live entities matching `criteria`.
    ///
    /// # Errors
    ///
    /// [`DataError::InvalidCriteria`] when the page size exceeds the
    /// configured maximum, plus every resolution and mapping error.
    #[tracing::instrument(level = "debug", skip(self, criteria), fields(first = criteria.first_result(), max = criteria.max_results()))]
    pub async fn find(&self, kind: &str, criteria: SearchCriteria) -> DataResult<ResultPage> {
        let (definition, record_type) = self.resolve(kind)?;
        if criteria.max_results() > self.max_page_size {
            return Err(DataError::InvalidCriteria(format!(
                "max_results {} exceeds the limit of {}",
                criteria.max_results(),
                self.max_page_size
            )));
        }
        let table = FieldAccessTable::bind(&definition, &record_type)?;
        let query = RecordQuery::from_criteria(&table, record_type.clone(), &criteria)?;

        let mut session = self.storage.begin(SessionMode::ReadOnly).await?;
        let total_count = session.count(&query).await?;
        let rows = session.fetch(&query).await?;
        session.rollback().await?;
        debug!(total_count, rows = rows.len(), "search executed");

        let mapper = EntityMapper::new(&table);
        let entities = rows
            .iter()
            .map(|row| mapper.to_generic(row))
            .collect::<DataResult<Vec<_>>>()?;
        Ok(ResultPage::new(entities, criteria, total_count))
    }

    /// Insert `entity` when it has no id, otherwise update the fields it
    /// carries on the live record with that id. Returns the stored state.
    ///
    /// # Errors
    ///
    /// [`DataError::EntityNotFound`] when updating a missing or deleted
    /// record; mapping errors are raised before any storage access.
    #[tracing::instrument(level = "debug", skip(self, entity), fields(id = ?entity.id()))]
    pub async fn save(&self, kind: &str, entity: &GenericEntity) -> DataResult<GenericEntity> {
        let (definition, record_type) = self.resolve(kind)?;
        let table = FieldAccessTable::bind(&definition, &record_type)?;
        let mapper = EntityMapper::new(&table);
        let mode = match entity.id() {
            None => WriteMode::Insert,
            Some(_) => WriteMode::Update,
        };
        let values = mapper.from_generic(entity, mode)?;
        let not_found = |id| DataError::EntityNotFound {
            kind: definition.kind().to_string(),
            id,
        };

        let mut session = self.storage.begin(SessionMode::ReadWrite).await?;
        let id = match entity.id() {
            None => {
                let id = session.insert(&record_type, &values).await?;
                debug!(%id, "record inserted");
                id
            }
            Some(id) => {
                let affected = if values.is_empty() {
                    session
                        .count(&RecordQuery::by_id(record_type.clone(), id))
                        .await?
                } else {
                    session.update(&record_type, id, &values).await?
                };
                if affected == 0 {
                    return Err(not_found(id));
                }
                debug!(%id, columns = values.len(), "record updated");
                id
            }
        };
        let rows = session
            .fetch(&RecordQuery::by_id(record_type.clone(), id))
            .await?;
        let row = rows.first().ok_or_else(|| not_found(id))?;
        let saved = mapper.to_generic(row)?;
        session.commit().await?;
        Ok(saved)
    }

    fn resolve(&self, kind: &str) -> DataResult<(Arc<DataDefinition>, Arc<RecordType>)> {
        let kind: EntityKind = kind.parse()?;
        let definition = self
            .schemas
            .resolve(&kind)
            .ok_or_else(|| DataError::SchemaNotFound(kind.to_string()))?;
        let record_type = self.record_types.resolve(&definition)?;
        Ok((definition, record_type))
    }
}
