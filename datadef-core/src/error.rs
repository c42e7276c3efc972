use thiserror::Error;

use crate::config::ConfigError;
use crate::value::EntityId;

/// Errors raised by the data-access layer.
///
/// Every variant aborts the call in progress; nothing is retried locally
/// and no partially mapped entity is ever returned.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data definition not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid entity kind: {0:?}")]
    InvalidEntityKind(String),

    #[error("data definition registered twice: {0}")]
    DuplicateDefinition(String),

    #[error("virtual tables are not supported: {0}")]
    VirtualTable(String),

    #[error("cannot find record type for definition {kind}: {record_type}")]
    RecordTypeNotFound { kind: String, record_type: String },

    #[error("custom fields are not supported: {kind}.{field}")]
    UnsupportedField { kind: String, field: String },

    #[error("cannot get value of the id of {record_type}: {detail}")]
    IdentityAccess { record_type: String, detail: String },

    #[error("value of the property {record_type}.{field} has invalid type: expected {expected}, found {actual}")]
    TypeMismatch {
        record_type: String,
        field: String,
        expected: String,
        actual: &'static str,
    },

    #[error("field {field} is not mapped by record type {record_type}")]
    UnmappedField { record_type: String, field: String },

    #[error("unknown field {field} for {kind}")]
    UnknownField { kind: String, field: String },

    #[error("missing value for required field {kind}.{field}")]
    MissingRequiredField { kind: String, field: String },

    #[error("invalid search criteria: {0}")]
    InvalidCriteria(String),

    #[error("entity {kind}#{id} not found")]
    EntityNotFound { kind: String, id: EntityId },

    #[error("{0} requires a read-write session")]
    ReadOnlySession(&'static str),

    #[error("invalid {kind} identifier: {ident}")]
    InvalidIdentifier { kind: &'static str, ident: String },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DataError {
    /// Wrap a driver-specific error.
    ///
    /// Used by backend crates (e.g. `datadef-data-sqlx`) to surface their
    /// native errors.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Storage(Box::new(err))
    }
}

/// Convenience alias for data-layer results.
pub type DataResult<T> = Result<T, DataError>;
