//! datadef: schema-driven generic data access.
//!
//! Callers read and write [`GenericEntity`] values by kind name; the
//! [`DataAccessService`] maps them onto typed record types, hides
//! soft-deleted rows and pages search results.
//!
//! ```ignore
//! use datadef::prelude::*;
//!
//! datadef::init_tracing();
//! let config = DatadefConfig::load("dev")?;
//! let service = datadef::connect_sqlite(&config, schemas, record_types).await?;
//! let orders = service.find("order", SearchCriteria::first_page(20)?).await?;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate               |
//! |----------|---------|---------------------|
//! | `sqlite` | **yes** | `datadef-data-sqlx` |

pub use datadef_core;
pub use datadef_data;

#[cfg(feature = "sqlite")]
pub use datadef_data_sqlx;

pub use datadef_core::{
    AccessConfig, DataDefinition, DataError, DataResult, DataSourceConfig, DatadefConfig,
    EntityId, EntityKind, FieldDefinition, FieldType, FieldValue, GenericEntity,
    InMemorySchemaRegistry, SchemaRegistry,
};
pub use datadef_data::{
    DataAccessService, Order, Record, RecordType, RecordTypeRegistry, RecordTypeResolver,
    Restriction, ResultPage, SearchCriteria, SessionMode, Storage, StorageSession,
};

#[cfg(feature = "sqlite")]
pub use datadef_data_sqlx::SqlxStorage;

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber.
///
/// Respects `RUST_LOG` and falls back to `info`. Call once at the start of
/// `main`; a second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build a service over SQLite from the `datadef.datasource` and
/// `datadef.access` sections of `config`.
#[cfg(feature = "sqlite")]
pub async fn connect_sqlite(
    config: &DatadefConfig,
    schemas: impl SchemaRegistry + 'static,
    record_types: impl RecordTypeResolver + 'static,
) -> DataResult<DataAccessService<SqlxStorage>> {
    let datasource: DataSourceConfig = config.section()?;
    let access: AccessConfig = config.section()?;
    let storage = SqlxStorage::connect(&datasource).await?;
    Ok(DataAccessService::new(schemas, record_types, storage).with_access_config(&access))
}

pub mod prelude {
    //! Everything needed to define schemas and run data access calls.
    pub use crate::{
        AccessConfig, DataAccessService, DataDefinition, DataError, DataResult, DatadefConfig,
        EntityId, EntityKind, FieldDefinition, FieldType, FieldValue, GenericEntity,
        InMemorySchemaRegistry, Order, Record, RecordType, RecordTypeRegistry, Restriction,
        ResultPage, SchemaRegistry, SearchCriteria,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::SqlxStorage;
}
