//! Concrete record types and the resolver that maps definitions onto them.
//!
//! A [`RecordType`] is the storage-side counterpart of a
//! [`DataDefinition`]: the table it lives in, its id and deletion-marker
//! columns, and the physical type of every mapped column. Rust types that
//! model a table implement [`Record`] and are registered once in a
//! [`RecordTypeRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use datadef_core::{DataDefinition, DataError, DataResult, EntityId, FieldValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sql::is_valid_identifier;

pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_DELETED_COLUMN: &str = "deleted";

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Physical type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    Integer,
    Decimal,
    Text,
    Date,
    DateTime,
    Reference,
}

impl ColumnType {
    /// Coerce a raw value decoded by a backend into the typed variant this
    /// column stores.
    ///
    /// Values that cannot be coerced are returned unchanged so that the
    /// field type check reports what storage actually holds.
    pub fn coerce(self, raw: FieldValue) -> FieldValue {
        match (self, raw) {
            (ColumnType::Boolean, FieldValue::Integer(0)) => FieldValue::Boolean(false),
            (ColumnType::Boolean, FieldValue::Integer(1)) => FieldValue::Boolean(true),
            (ColumnType::Decimal, FieldValue::Integer(i)) => FieldValue::Decimal(Decimal::from(i)),
            (ColumnType::Decimal, FieldValue::String(s)) => match s.trim().parse::<Decimal>() {
                Ok(d) => FieldValue::Decimal(d),
                Err(_) => FieldValue::String(s),
            },
            (ColumnType::Date, FieldValue::String(s)) => {
                match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
                    Ok(d) => FieldValue::Date(d),
                    Err(_) => FieldValue::String(s),
                }
            }
            (ColumnType::DateTime, FieldValue::String(s)) => {
                match NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT) {
                    Ok(dt) => FieldValue::DateTime(dt),
                    Err(_) => FieldValue::String(s),
                }
            }
            (ColumnType::Integer, FieldValue::Reference(id)) => FieldValue::Integer(id.get()),
            (ColumnType::Reference, FieldValue::Integer(i)) => FieldValue::Reference(EntityId::new(i)),
            (_, other) => other,
        }
    }
}

/// One mapped column of a [`RecordType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// The concrete persisted shape a non-virtual definition maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    name: String,
    table: String,
    id_column: String,
    deleted_column: String,
    columns: Vec<Column>,
}

impl RecordType {
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            table: table.into(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            deleted_column: DEFAULT_DELETED_COLUMN.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn deleted_column(&self) -> &str {
        &self.deleted_column
    }

    /// Mapped data columns, excluding the id and deletion marker.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every physical column in select order: id, data columns, marker.
    pub fn select_columns(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.columns.len() + 2);
        out.push(self.id_column.as_str());
        out.extend(self.columns.iter().map(|c| c.name.as_str()));
        out.push(self.deleted_column.as_str());
        out
    }

    /// Physical type of any selectable column, id and marker included.
    pub fn column_type_of(&self, name: &str) -> Option<ColumnType> {
        if name == self.id_column {
            Some(ColumnType::Integer)
        } else if name == self.deleted_column {
            Some(ColumnType::Boolean)
        } else {
            self.column(name).map(Column::column_type)
        }
    }
}

/// Builder for [`RecordType`], validating every identifier on `build`.
#[derive(Debug, Clone)]
pub struct RecordTypeBuilder {
    name: String,
    table: String,
    id_column: String,
    deleted_column: String,
    columns: Vec<Column>,
}

impl RecordTypeBuilder {
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn deleted_column(mut self, column: impl Into<String>) -> Self {
        self.deleted_column = column.into();
        self
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column {
            name: name.into(),
            column_type,
        });
        self
    }

    pub fn build(self) -> DataResult<RecordType> {
        check_identifier("table", &self.table)?;
        check_identifier("column", &self.id_column)?;
        check_identifier("column", &self.deleted_column)?;
        let mut seen = vec![self.id_column.as_str(), self.deleted_column.as_str()];
        for column in &self.columns {
            check_identifier("column", &column.name)?;
            if seen.contains(&column.name.as_str()) {
                return Err(DataError::InvalidIdentifier {
                    kind: "duplicate column",
                    ident: column.name.clone(),
                });
            }
            seen.push(&column.name);
        }
        Ok(RecordType {
            name: self.name,
            table: self.table,
            id_column: self.id_column,
            deleted_column: self.deleted_column,
            columns: self.columns,
        })
    }
}

fn check_identifier(kind: &'static str, ident: &str) -> DataResult<()> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(DataError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        })
    }
}

/// A Rust type standing for one mapped table.
///
/// # Example
///
/// ```ignore
/// struct OrderRecord;
///
/// impl Record for OrderRecord {
///     fn record_type_name() -> &'static str { "orders" }
///     fn table_name() -> &'static str { "orders" }
///     fn columns() -> &'static [(&'static str, ColumnType)] {
///         &[("state", ColumnType::Text), ("plannedQuantity", ColumnType::Decimal)]
///     }
/// }
/// ```
pub trait Record: Send + Sync + 'static {
    /// Identifier data definitions use to refer to this record type.
    fn record_type_name() -> &'static str;
    fn table_name() -> &'static str;
    fn columns() -> &'static [(&'static str, ColumnType)];

    fn id_column() -> &'static str {
        DEFAULT_ID_COLUMN
    }

    fn deleted_column() -> &'static str {
        DEFAULT_DELETED_COLUMN
    }

    fn record_type() -> DataResult<RecordType> {
        Self::columns()
            .iter()
            .fold(
                RecordType::builder(Self::record_type_name(), Self::table_name())
                    .id_column(Self::id_column())
                    .deleted_column(Self::deleted_column()),
                |builder, (name, ty)| builder.column(*name, *ty),
            )
            .build()
    }
}

/// Resolves the concrete record type of a data definition.
pub trait RecordTypeResolver: Send + Sync {
    /// # Errors
    ///
    /// [`DataError::VirtualTable`] for virtual definitions,
    /// [`DataError::RecordTypeNotFound`] when nothing is registered under the
    /// definition's record type.
    fn resolve(&self, definition: &DataDefinition) -> DataResult<Arc<RecordType>>;
}

impl<T: RecordTypeResolver + ?Sized> RecordTypeResolver for Arc<T> {
    fn resolve(&self, definition: &DataDefinition) -> DataResult<Arc<RecordType>> {
        (**self).resolve(definition)
    }
}

/// Record types registered by name.
#[derive(Debug, Default, Clone)]
pub struct RecordTypeRegistry {
    types: HashMap<String, Arc<RecordType>>,
}

impl RecordTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type. A later registration under the same name
    /// replaces the earlier one.
    pub fn register(&mut self, record_type: RecordType) -> &mut Self {
        self.types
            .insert(record_type.name.clone(), Arc::new(record_type));
        self
    }

    /// Register the record type declared by `R`.
    pub fn register_record<R: Record>(&mut self) -> DataResult<&mut Self> {
        let record_type = R::record_type()?;
        Ok(self.register(record_type))
    }

    pub fn get(&self, name: &str) -> Option<Arc<RecordType>> {
        self.types.get(name).cloned()
    }
}

impl RecordTypeResolver for RecordTypeRegistry {
    fn resolve(&self, definition: &DataDefinition) -> DataResult<Arc<RecordType>> {
        if definition.is_virtual() {
            return Err(DataError::VirtualTable(definition.kind().to_string()));
        }
        let name = definition.record_type().unwrap_or_default();
        self.get(name).ok_or_else(|| DataError::RecordTypeNotFound {
            kind: definition.kind().to_string(),
            record_type: name.to_string(),
        })
    }
}

/// A row as held by storage: physical column names to raw values.
///
/// Never handed to callers; the entity mapper converts it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRecord {
    values: Vec<(String, FieldValue)>,
}

impl StoredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
