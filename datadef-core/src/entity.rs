use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{EntityId, FieldValue};

/// A dynamically shaped instance of some entity kind.
///
/// Produced by the data layer on reads, or built by callers for writes.
/// The identifier is absent for instances that were never persisted and
/// cannot be changed once set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<EntityId>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
}

impl GenericEntity {
    /// A new, not yet persisted entity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: EntityId) -> Self {
        Self {
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_has_no_id() {
        let entity = GenericEntity::new().with_field("name", "Widget");
        assert!(!entity.is_persisted());
        assert_eq!(entity.field("name"), Some(&FieldValue::from("Widget")));
    }

    #[test]
    fn test_json_shape() {
        let entity = GenericEntity::with_id(EntityId::new(7)).with_field("active", true);
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["fields"]["active"]["value"], true);
    }
}
