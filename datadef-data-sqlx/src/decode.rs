//! Conversion between SQLite values and [`FieldValue`]s.
//!
//! SQLite is dynamically typed, so rows are decoded by the storage class of
//! each value (`INTEGER`, `REAL`, `TEXT`, `BLOB`, `NULL`) rather than by the
//! declared column type. Interpreting the raw value (0/1 as boolean, text
//! as date...) is left to [`ColumnType::coerce`](datadef_data::ColumnType::coerce)
//! so that type checks see what the database really holds.

use datadef_core::{DataResult, FieldValue};
use datadef_data::record::{DATETIME_FORMAT, DATE_FORMAT};
use datadef_data::StoredRecord;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::error::SqlxResultExt;

/// Decode every column of a row under its column name.
pub fn decode_row(row: &SqliteRow) -> DataResult<StoredRecord> {
    let mut record = StoredRecord::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.set(column.name(), decode_value(row, index)?);
    }
    Ok(record)
}

fn decode_value(row: &SqliteRow, index: usize) -> DataResult<FieldValue> {
    let raw = row.try_get_raw(index).data_err()?;
    if raw.is_null() {
        return Ok(FieldValue::Null);
    }
    let storage_class = raw.type_info().name().to_string();
    let value = match storage_class.as_str() {
        "INTEGER" => FieldValue::Integer(row.try_get::<i64, _>(index).data_err()?),
        // Legacy rows and NUMERIC affinity columns.
        "REAL" => {
            let real = row.try_get::<f64, _>(index).data_err()?;
            match Decimal::from_f64(real) {
                Some(d) => FieldValue::Decimal(d),
                None => FieldValue::String(real.to_string()),
            }
        }
        "BLOB" => {
            let bytes = row.try_get::<Vec<u8>, _>(index).data_err()?;
            FieldValue::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => FieldValue::String(row.try_get::<String, _>(index).data_err()?),
    };
    Ok(value)
}

/// Bind statement parameters in order.
///
/// Booleans bind as 0/1, decimals as their exact text form, dates and
/// datetimes as ISO text and references as their integer id.
///
/// SQLite still converts decimal text to `REAL` in columns with `NUMERIC`
/// affinity (e.g. declared `DECIMAL`); declare such columns `TEXT` to keep
/// more than 15 significant digits.
pub fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[FieldValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            FieldValue::Null => query.bind(None::<i64>),
            FieldValue::Boolean(b) => query.bind(*b),
            FieldValue::Integer(i) => query.bind(*i),
            FieldValue::Decimal(d) => query.bind(d.to_string()),
            FieldValue::String(s) => query.bind(s.clone()),
            FieldValue::Date(d) => query.bind(d.format(DATE_FORMAT).to_string()),
            FieldValue::DateTime(dt) => query.bind(dt.format(DATETIME_FORMAT).to_string()),
            FieldValue::Reference(id) => query.bind(id.get()),
        };
    }
    query
}
