use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::value::FieldValue;

/// Name of a logical entity type, optionally qualified by a namespace.
///
/// Parsed from `"name"` or `"namespace.name"`, e.g. `"products.order"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKind {
    namespace: Option<String>,
    name: String,
}

impl EntityKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for EntityKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DataError::InvalidEntityKind(s.to_string());
        let kind = match s.split_once('.') {
            Some((namespace, name)) => {
                if namespace.is_empty() || name.is_empty() || name.contains('.') {
                    return Err(invalid());
                }
                EntityKind::namespaced(namespace, name)
            }
            None if s.is_empty() => return Err(invalid()),
            None => EntityKind::new(s),
        };
        if kind.name.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(kind)
    }
}

impl TryFrom<String> for EntityKind {
    type Error = DataError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    Integer,
    Decimal,
    String,
    Text,
    Date,
    DateTime,
    /// A string restricted to a fixed set of values.
    Enum { values: Vec<String> },
    /// Identifier of an entity of another kind.
    Reference { kind: EntityKind },
}

impl FieldType {
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldType::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn reference(kind: EntityKind) -> Self {
        FieldType::Reference { kind }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Enum { .. } => "enum",
            FieldType::Reference { .. } => "reference",
        }
    }

    /// Human readable form including enum values, for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            FieldType::Enum { values } => format!("enum({})", values.join("|")),
            FieldType::Reference { kind } => format!("reference({kind})"),
            other => other.name().to_string(),
        }
    }

    /// Whether `value` is a valid value for a field of this type.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) => true,
            (FieldType::Boolean, FieldValue::Boolean(_)) => true,
            (FieldType::Integer, FieldValue::Integer(_)) => true,
            (FieldType::Decimal, FieldValue::Decimal(_)) => true,
            (FieldType::String | FieldType::Text, FieldValue::String(_)) => true,
            (FieldType::Enum { values }, FieldValue::String(s)) => values.iter().any(|v| v == s),
            (FieldType::Date, FieldValue::Date(_)) => true,
            (FieldType::DateTime, FieldValue::DateTime(_)) => true,
            (FieldType::Reference { .. }, FieldValue::Reference(_)) => true,
            _ => false,
        }
    }

    /// Whether `LIKE` pattern matching is meaningful for this type.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Text | FieldType::Enum { .. }
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// One field of a [`DataDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    /// Not backed by a mapped property of the record type.
    #[serde(default)]
    custom: bool,
    #[serde(default)]
    required: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            custom: false,
            required: false,
        }
    }

    /// Mark the field as custom (stored outside the mapped record).
    pub fn custom(mut self) -> Self {
        self.custom = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// The declared shape of an entity kind.
///
/// A definition either maps onto a concrete record type through
/// `record_type`, or is a virtual table with no physical backing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDefinition {
    kind: EntityKind,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
    #[serde(default)]
    virtual_table: bool,
    #[serde(default)]
    record_type: Option<String>,
}

impl DataDefinition {
    /// A definition backed by the record type registered under `record_type`.
    pub fn new(kind: EntityKind, record_type: impl Into<String>) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            virtual_table: false,
            record_type: Some(record_type.into()),
        }
    }

    /// A definition without physical backing.
    pub fn virtual_table(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            virtual_table: true,
            record_type: None,
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_table
    }

    pub fn record_type(&self) -> Option<&str> {
        self.record_type.as_deref()
    }
}
