//! # datadef-core
//!
//! Shared vocabulary of the datadef data-access layer: the dynamic
//! [`FieldValue`] union, [`DataDefinition`] schemas and their
//! [`SchemaRegistry`], the caller-facing [`GenericEntity`], the
//! [`DataError`] taxonomy and the YAML/env backed [`config`].
//!
//! Storage-facing pieces (record types, queries, sessions) live in
//! `datadef-data`.

pub mod config;
pub mod entity;
pub mod error;
pub mod registry;
pub mod schema;
pub mod value;

pub use config::{AccessConfig, ConfigError, DataSourceConfig, DatadefConfig};
pub use entity::GenericEntity;
pub use error::{DataError, DataResult};
pub use registry::{InMemorySchemaRegistry, SchemaRegistry};
pub use schema::{DataDefinition, EntityKind, FieldDefinition, FieldType};
pub use value::{EntityId, FieldValue};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{
        DataDefinition, DataError, DataResult, EntityId, EntityKind, FieldDefinition, FieldType,
        FieldValue, GenericEntity, InMemorySchemaRegistry, SchemaRegistry,
    };
}
