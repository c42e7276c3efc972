//! # datadef-data-sqlx
//!
//! SQLite backend for the datadef data layer on top of
//! [SQLx](https://github.com/launchbadge/sqlx).
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxStorage`] | [`Storage`](datadef_data::Storage) holding an `sqlx::SqlitePool` |
//! | [`SqlxSession`] | One transaction; commit on success, rollback on drop |
//! | [`SqlxErrorExt`] | Converts `sqlx::Error` into `DataError` (`.into_data_error()`) |
//!
//! Every statement is generated by [`QueryBuilder`](datadef_data::QueryBuilder)
//! with the SQLite dialect. Tables are expected to exist; the backend never
//! creates or migrates schema.
//!
//! ```ignore
//! use datadef_data_sqlx::SqlxStorage;
//!
//! let storage = SqlxStorage::connect(&DataSourceConfig::new("sqlite://app.db")).await?;
//! let page = DataAccessService::new(schemas, record_types, storage)
//!     .find("order", SearchCriteria::first_page(20)?)
//!     .await?;
//! ```

pub mod decode;
pub mod error;
mod storage;
pub mod tx;

pub use error::{SqlxErrorExt, SqlxResultExt};
pub use storage::SqlxStorage;
pub use tx::SqlxSession;

/// Re-exports of the most commonly used types from both `datadef-data` and this crate.
pub mod prelude {
    pub use crate::{SqlxErrorExt, SqlxStorage};
    pub use datadef_data::prelude::*;
}
