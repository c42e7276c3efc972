//! Typed field access between schema fields and record columns.
//!
//! A [`FieldAccessTable`] is bound once per call from a definition and its
//! record type. Binding fails up front for custom fields and fields with no
//! backing column, so no storage access happens for definitions this layer
//! cannot serve.

use datadef_core::{DataDefinition, DataError, DataResult, EntityId, FieldDefinition, FieldValue};

use crate::record::{Column, ColumnType, RecordType, StoredRecord};

/// Getter/setter pair for one schema field.
#[derive(Debug, Clone, Copy)]
pub struct FieldAccessor<'a> {
    field: &'a FieldDefinition,
    column: &'a Column,
    record_type: &'a RecordType,
}

impl<'a> FieldAccessor<'a> {
    pub fn field(&self) -> &'a FieldDefinition {
        self.field
    }

    pub fn column(&self) -> &'a str {
        self.column.name()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column.column_type()
    }

    /// Read the field's value from a stored record, validating its type.
    ///
    /// # Errors
    ///
    /// [`DataError::UnmappedField`] when the record lacks the column,
    /// [`DataError::TypeMismatch`] when the stored value does not satisfy the
    /// declared field type.
    pub fn read(&self, record: &StoredRecord) -> DataResult<FieldValue> {
        let raw = record
            .get(self.column.name())
            .ok_or_else(|| DataError::UnmappedField {
                record_type: self.record_type.name().to_string(),
                field: self.field.name().to_string(),
            })?;
        let value = self.column.column_type().coerce(raw.clone());
        self.check(&value)?;
        Ok(value)
    }

    /// Write a value into the record after validating it.
    pub fn write(&self, record: &mut StoredRecord, value: FieldValue) -> DataResult<()> {
        self.check(&value)?;
        record.set(self.column.name(), value);
        Ok(())
    }

    /// Validate a value against the declared field type.
    pub fn check(&self, value: &FieldValue) -> DataResult<()> {
        if self.field.field_type().accepts(value) {
            Ok(())
        } else {
            Err(DataError::TypeMismatch {
                record_type: self.record_type.name().to_string(),
                field: self.field.name().to_string(),
                expected: self.field.field_type().describe(),
                actual: value.type_name(),
            })
        }
    }
}

/// Field accessors for every field of a definition, in definition order.
#[derive(Debug, Clone)]
pub struct FieldAccessTable<'a> {
    definition: &'a DataDefinition,
    record_type: &'a RecordType,
    accessors: Vec<FieldAccessor<'a>>,
}

impl<'a> FieldAccessTable<'a> {
    /// Bind each field of `definition` to its column in `record_type`.
    ///
    /// # Errors
    ///
    /// [`DataError::UnsupportedField`] for a custom field,
    /// [`DataError::UnmappedField`] for a field the record type has no
    /// column for.
    pub fn bind(definition: &'a DataDefinition, record_type: &'a RecordType) -> DataResult<Self> {
        let accessors = definition
            .fields()
            .iter()
            .map(|field| {
                if field.is_custom() {
                    return Err(DataError::UnsupportedField {
                        kind: definition.kind().to_string(),
                        field: field.name().to_string(),
                    });
                }
                let column =
                    record_type
                        .column(field.name())
                        .ok_or_else(|| DataError::UnmappedField {
                            record_type: record_type.name().to_string(),
                            field: field.name().to_string(),
                        })?;
                Ok(FieldAccessor {
                    field,
                    column,
                    record_type,
                })
            })
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self {
            definition,
            record_type,
            accessors,
        })
    }

    pub fn definition(&self) -> &'a DataDefinition {
        self.definition
    }

    pub fn record_type(&self) -> &'a RecordType {
        self.record_type
    }

    pub fn accessors(&self) -> &[FieldAccessor<'a>] {
        &self.accessors
    }

    /// Accessor for a field by name.
    ///
    /// # Errors
    ///
    /// [`DataError::UnknownField`] when the definition has no such field.
    pub fn accessor(&self, field: &str) -> DataResult<&FieldAccessor<'a>> {
        self.accessors
            .iter()
            .find(|a| a.field.name() == field)
            .ok_or_else(|| DataError::UnknownField {
                kind: self.definition.kind().to_string(),
                field: field.to_string(),
            })
    }

    /// Read the record identifier.
    ///
    /// # Errors
    ///
    /// [`DataError::IdentityAccess`] when the id column is absent, null or
    /// not an integer.
    pub fn read_id(&self, record: &StoredRecord) -> DataResult<EntityId> {
        let fail = |detail: String| DataError::IdentityAccess {
            record_type: self.record_type.name().to_string(),
            detail,
        };
        match record.get(self.record_type.id_column()) {
            Some(FieldValue::Integer(id)) => Ok(EntityId::new(*id)),
            Some(FieldValue::Reference(id)) => Ok(*id),
            Some(other) => Err(fail(format!("id has type {}", other.type_name()))),
            None => Err(fail(format!(
                "column {} missing",
                self.record_type.id_column()
            ))),
        }
    }
}
