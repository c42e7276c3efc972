use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DataError, DataResult};
use crate::schema::{DataDefinition, EntityKind};

/// Resolves entity kinds to their data definitions.
///
/// Definitions are treated as immutable for the lifetime of the process.
pub trait SchemaRegistry: Send + Sync {
    fn resolve(&self, kind: &EntityKind) -> Option<Arc<DataDefinition>>;
}

impl<T: SchemaRegistry + ?Sized> SchemaRegistry for Arc<T> {
    fn resolve(&self, kind: &EntityKind) -> Option<Arc<DataDefinition>> {
        (**self).resolve(kind)
    }
}

/// A [`SchemaRegistry`] holding definitions registered in code.
#[derive(Debug, Default, Clone)]
pub struct InMemorySchemaRegistry {
    definitions: HashMap<EntityKind, Arc<DataDefinition>>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its own kind.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::DuplicateDefinition`] when the kind is taken, so
    /// that every kind resolves to exactly one definition.
    pub fn register(&mut self, definition: DataDefinition) -> DataResult<()> {
        let kind = definition.kind().clone();
        if self.definitions.contains_key(&kind) {
            return Err(DataError::DuplicateDefinition(kind.to_string()));
        }
        tracing::debug!(%kind, fields = definition.fields().len(), "registered data definition");
        self.definitions.insert(kind, Arc::new(definition));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, definition: DataDefinition) -> DataResult<Self> {
        self.register(definition)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn resolve(&self, kind: &EntityKind) -> Option<Arc<DataDefinition>> {
        self.definitions.get(kind).cloned()
    }
}
