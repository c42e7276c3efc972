use datadef_core::{DataError, DataResult, FieldValue, GenericEntity};

use crate::accessor::FieldAccessTable;
use crate::record::StoredRecord;

/// Whether a write creates a record or changes an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every mapped column is written; absent fields become `Null`.
    Insert,
    /// Only the fields present on the entity are written.
    Update,
}

/// Converts between stored records and generic entities.
#[derive(Debug, Clone, Copy)]
pub struct EntityMapper<'t, 'a> {
    table: &'t FieldAccessTable<'a>,
}

impl<'t, 'a> EntityMapper<'t, 'a> {
    pub fn new(table: &'t FieldAccessTable<'a>) -> Self {
        Self { table }
    }

    /// Build a generic entity from a stored record.
    ///
    /// The entity carries exactly the definition's fields; any other column
    /// the record holds is ignored.
    pub fn to_generic(&self, record: &StoredRecord) -> DataResult<GenericEntity> {
        let mut entity = GenericEntity::with_id(self.table.read_id(record)?);
        for accessor in self.table.accessors() {
            entity.set_field(accessor.field().name(), accessor.read(record)?);
        }
        Ok(entity)
    }

    /// Column assignments for writing `entity`.
    ///
    /// # Errors
    ///
    /// [`DataError::UnknownField`] for keys outside the definition,
    /// [`DataError::UnsupportedField`] for custom fields,
    /// [`DataError::TypeMismatch`] for mistyped values and
    /// [`DataError::MissingRequiredField`] when a required field would end
    /// up null.
    pub fn from_generic(&self, entity: &GenericEntity, mode: WriteMode) -> DataResult<StoredRecord> {
        let definition = self.table.definition();
        for name in entity.fields().keys() {
            match definition.field(name) {
                Some(field) if field.is_custom() => {
                    return Err(DataError::UnsupportedField {
                        kind: definition.kind().to_string(),
                        field: name.clone(),
                    })
                }
                Some(_) => {}
                None => {
                    return Err(DataError::UnknownField {
                        kind: definition.kind().to_string(),
                        field: name.clone(),
                    })
                }
            }
        }

        let mut record = StoredRecord::new();
        for accessor in self.table.accessors() {
            let field = accessor.field();
            let value = match (entity.field(field.name()), mode) {
                (Some(value), _) => value.clone(),
                (None, WriteMode::Insert) => FieldValue::Null,
                (None, WriteMode::Update) => continue,
            };
            if field.is_required() && value.is_null() {
                return Err(DataError::MissingRequiredField {
                    kind: definition.kind().to_string(),
                    field: field.name().to_string(),
                });
            }
            accessor.write(&mut record, value)?;
        }
        Ok(record)
    }
}
