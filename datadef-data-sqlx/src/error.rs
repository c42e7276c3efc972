use datadef_core::{DataError, DataResult};

/// Extension trait for converting `sqlx::Error` into `DataError`.
///
/// Due to Rust's orphan rules, we can't implement `From<sqlx::Error> for DataError`
/// in this crate. Instead, use `.into_data_error()`, or `.data_err()` on results.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match self {
            sqlx::Error::ColumnDecode { index, source } => DataError::Storage(
                format!("cannot decode column {index}: {source}").into(),
            ),
            other => DataError::storage(other),
        }
    }
}

/// `map_err(SqlxErrorExt::into_data_error)` in method form.
pub trait SqlxResultExt<T> {
    fn data_err(self) -> DataResult<T>;
}

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn data_err(self) -> DataResult<T> {
        self.map_err(SqlxErrorExt::into_data_error)
    }
}
