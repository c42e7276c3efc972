//! Ready-made definitions and record types for tests.
//!
//! | kind     | record type | notes                                        |
//! |----------|-------------|----------------------------------------------|
//! | `order`  | `orders`    | `state: string`, `plannedQuantity: decimal`   |
//! | `widget` | `widgets`   | required `name`, boolean `active`             |
//! | `product`| `products`  | enum `status`, date `releasedOn`              |
//! | `report` | none        | virtual                                      |
//! | `note`   | `notes`     | custom field `body`                           |

use datadef_core::{
    DataDefinition, EntityKind, FieldDefinition, FieldType, InMemorySchemaRegistry,
};
use datadef_data::{ColumnType, DataAccessService, Record, RecordTypeRegistry, Storage};

pub const PRODUCT_STATUSES: [&str; 3] = ["01draft", "02released", "03retired"];

pub struct OrderRecord;

impl Record for OrderRecord {
    fn record_type_name() -> &'static str {
        "orders"
    }
    fn table_name() -> &'static str {
        "orders"
    }
    fn columns() -> &'static [(&'static str, ColumnType)] {
        &[
            ("state", ColumnType::Text),
            ("plannedQuantity", ColumnType::Decimal),
        ]
    }
}

pub struct WidgetRecord;

impl Record for WidgetRecord {
    fn record_type_name() -> &'static str {
        "widgets"
    }
    fn table_name() -> &'static str {
        "widgets"
    }
    fn columns() -> &'static [(&'static str, ColumnType)] {
        &[
            ("name", ColumnType::Text),
            ("active", ColumnType::Boolean),
            ("legacyCode", ColumnType::Text),
        ]
    }
}

pub struct ProductRecord;

impl Record for ProductRecord {
    fn record_type_name() -> &'static str {
        "products"
    }
    fn table_name() -> &'static str {
        "products"
    }
    fn columns() -> &'static [(&'static str, ColumnType)] {
        &[
            ("code", ColumnType::Text),
            ("status", ColumnType::Text),
            ("releasedOn", ColumnType::Date),
        ]
    }
    fn deleted_column() -> &'static str {
        "removed"
    }
}

pub struct NoteRecord;

impl Record for NoteRecord {
    fn record_type_name() -> &'static str {
        "notes"
    }
    fn table_name() -> &'static str {
        "notes"
    }
    fn columns() -> &'static [(&'static str, ColumnType)] {
        &[("title", ColumnType::Text), ("body", ColumnType::Text)]
    }
}

pub fn order_definition() -> DataDefinition {
    DataDefinition::new(EntityKind::new("order"), OrderRecord::record_type_name())
        .with_field(FieldDefinition::new("state", FieldType::String))
        .with_field(FieldDefinition::new("plannedQuantity", FieldType::Decimal))
}

pub fn widget_definition() -> DataDefinition {
    DataDefinition::new(EntityKind::new("widget"), WidgetRecord::record_type_name())
        .with_field(FieldDefinition::new("name", FieldType::String).required())
        .with_field(FieldDefinition::new("active", FieldType::Boolean))
}

pub fn product_definition() -> DataDefinition {
    DataDefinition::new(EntityKind::new("product"), ProductRecord::record_type_name())
        .with_field(FieldDefinition::new("code", FieldType::String).required())
        .with_field(FieldDefinition::new(
            "status",
            FieldType::enumeration(PRODUCT_STATUSES),
        ))
        .with_field(FieldDefinition::new("releasedOn", FieldType::Date))
}

pub fn report_definition() -> DataDefinition {
    DataDefinition::virtual_table(EntityKind::new("report"))
        .with_field(FieldDefinition::new("total", FieldType::Decimal))
}

pub fn note_definition() -> DataDefinition {
    DataDefinition::new(EntityKind::new("note"), NoteRecord::record_type_name())
        .with_field(FieldDefinition::new("title", FieldType::String))
        .with_field(FieldDefinition::new("body", FieldType::Text).custom())
}

/// Every fixture definition.
pub fn schema_registry() -> InMemorySchemaRegistry {
    let mut registry = InMemorySchemaRegistry::new();
    for definition in [
        order_definition(),
        widget_definition(),
        product_definition(),
        report_definition(),
        note_definition(),
    ] {
        registry
            .register(definition)
            .expect("fixture kinds are unique");
    }
    registry
}

/// Every fixture record type.
pub fn record_type_registry() -> RecordTypeRegistry {
    let mut registry = RecordTypeRegistry::new();
    registry
        .register_record::<OrderRecord>()
        .and_then(|r| r.register_record::<WidgetRecord>())
        .and_then(|r| r.register_record::<ProductRecord>())
        .and_then(|r| r.register_record::<NoteRecord>())
        .expect("fixture record types are valid");
    registry
}

/// A service over the fixture schemas and the given storage.
pub fn service<S: Storage>(storage: S) -> DataAccessService<S> {
    DataAccessService::new(schema_registry(), record_type_registry(), storage)
}
