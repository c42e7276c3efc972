//! # datadef-data
//!
//! Storage-facing half of datadef: [`RecordType`]s and their resolver, the
//! typed [`FieldAccessTable`], the [`EntityMapper`], soft-delete aware
//! [`RecordQuery`]s and their SQL rendering, the [`Storage`] /
//! [`StorageSession`] traits backends implement, and the
//! [`DataAccessService`] facade.

pub mod accessor;
pub mod criteria;
pub mod filter;
pub mod mapper;
pub mod page;
pub mod query;
pub mod record;
pub mod service;
pub mod sql;
pub mod storage;

pub use accessor::{FieldAccessTable, FieldAccessor};
pub use criteria::{Order, Restriction, SearchCriteria};
pub use mapper::{EntityMapper, WriteMode};
pub use page::ResultPage;
pub use query::{Condition, RecordQuery};
pub use record::{
    Column, ColumnType, Record, RecordType, RecordTypeBuilder, RecordTypeRegistry,
    RecordTypeResolver, StoredRecord,
};
pub use service::DataAccessService;
pub use sql::{Dialect, IdentifierPolicy, QueryBuilder, SqlStatement};
pub use storage::{SessionMode, Storage, StorageSession};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        ColumnType, DataAccessService, Order, Record, RecordType, RecordTypeRegistry, Restriction,
        ResultPage, SearchCriteria, SessionMode, Storage, StorageSession, StoredRecord,
    };
    pub use datadef_core::{DataError, DataResult, EntityId, FieldValue, GenericEntity};
}
