use datadef_core::{AccessConfig, DataError, EntityId, FieldValue, GenericEntity};
use datadef_data::{Order, Restriction, SearchCriteria, StoredRecord};
use datadef_test::fixtures::service;
use datadef_test::{init_test_tracing, MemoryStorage};
use rust_decimal::Decimal;

fn order(id: i64, state: &str, quantity: Decimal) -> StoredRecord {
    StoredRecord::new()
        .with("id", id)
        .with("state", state)
        .with("plannedQuantity", quantity)
        .with("deleted", false)
}

async fn seeded_orders() -> MemoryStorage {
    init_test_tracing();
    let storage = MemoryStorage::new();
    storage
        .seed("orders", order(1, "01pending", Decimal::new(100, 1)))
        .await;
    storage
        .seed(
            "orders",
            StoredRecord::new().with("id", 2i64).with("deleted", true),
        )
        .await;
    storage
}

async fn many_orders(count: i64) -> MemoryStorage {
    init_test_tracing();
    let storage = MemoryStorage::new();
    for id in 1..=count {
        let state = if id % 2 == 0 { "02done" } else { "01pending" };
        storage
            .seed("orders", order(id, state, Decimal::from(id)))
            .await;
    }
    storage
}

fn ids(entities: &[GenericEntity]) -> Vec<i64> {
    entities
        .iter()
        .filter_map(|e| e.id().map(EntityId::get))
        .collect()
}

#[tokio::test]
async fn test_find_skips_soft_deleted_records() {
    let service = service(seeded_orders().await);

    let page = service
        .find("order", SearchCriteria::new(0, 10).unwrap())
        .await
        .unwrap();

    assert_eq!(page.total_count(), 1);
    assert_eq!(ids(page.entities()), vec![1]);
    let entity = &page.entities()[0];
    assert_eq!(entity.field("state"), Some(&FieldValue::from("01pending")));
    assert_eq!(
        entity.field("plannedQuantity"),
        Some(&FieldValue::Decimal(Decimal::new(100, 1)))
    );
}

#[tokio::test]
async fn test_delete_hides_but_keeps_record() {
    let storage = seeded_orders().await;
    let service = service(storage.clone());
    let id = EntityId::new(1);

    assert!(service.get("order", id).await.unwrap().is_some());
    service.delete("order", id).await.unwrap();

    assert!(service.get("order", id).await.unwrap().is_none());
    let page = service
        .find("order", SearchCriteria::first_page(10).unwrap())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_count(), 0);

    let rows = storage.rows("orders").await;
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r.get("deleted") == Some(&FieldValue::Boolean(true))));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let storage = seeded_orders().await;
    let service = service(storage.clone());

    service.delete("order", EntityId::new(1)).await.unwrap();
    let after_first = storage.rows("orders").await;
    service.delete("order", EntityId::new(1)).await.unwrap();
    assert_eq!(storage.rows("orders").await, after_first);

    // Already deleted and never existing ids are silent no-ops.
    service.delete("order", EntityId::new(2)).await.unwrap();
    service.delete("order", EntityId::new(99)).await.unwrap();
}

#[tokio::test]
async fn test_total_count_ignores_paging() {
    let service = service(many_orders(5).await);

    let first = service
        .find("order", SearchCriteria::new(0, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(ids(first.entities()), vec![1, 2]);
    assert_eq!(first.total_count(), 5);
    assert_eq!(first.total_pages(), 3);
    assert!(first.has_next());

    let last = service
        .find("order", SearchCriteria::page(2, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(ids(last.entities()), vec![5]);
    assert_eq!(last.total_count(), 5);
    assert!(!last.has_next());
}

#[tokio::test]
async fn test_out_of_range_offset_returns_empty_page() {
    let service = service(many_orders(3).await);

    let page = service
        .find("order", SearchCriteria::new(10, 5).unwrap())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_count(), 3);
}

#[tokio::test]
async fn test_get_maps_exactly_the_schema_fields() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    storage
        .seed(
            "widgets",
            StoredRecord::new()
                .with("id", 1i64)
                .with("name", "Widget")
                .with("active", 1i64)
                .with("legacyCode", "W-OLD")
                .with("deleted", FieldValue::Null),
        )
        .await;
    let service = service(storage);

    let entity = service
        .get("widget", EntityId::new(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entity.field("name"), Some(&FieldValue::from("Widget")));
    assert_eq!(entity.field("active"), Some(&FieldValue::Boolean(true)));
    assert_eq!(entity.fields().len(), 2);
}

#[tokio::test]
async fn test_type_mismatch_names_the_field() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    storage
        .seed(
            "widgets",
            StoredRecord::new()
                .with("id", 1i64)
                .with("name", "Widget")
                .with("active", "yes")
                .with("deleted", false),
        )
        .await;
    let service = service(storage);

    match service.get("widget", EntityId::new(1)).await {
        Err(DataError::TypeMismatch { field, actual, .. }) => {
            assert_eq!(field, "active");
            assert_eq!(actual, "string");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
    assert!(matches!(
        service
            .find("widget", SearchCriteria::first_page(5).unwrap())
            .await,
        Err(DataError::TypeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_virtual_table_rejected_before_storage() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage.clone());
    let id = EntityId::new(1);

    assert!(matches!(
        service.get("report", id).await,
        Err(DataError::VirtualTable(kind)) if kind == "report"
    ));
    assert!(matches!(
        service
            .find("report", SearchCriteria::first_page(10).unwrap())
            .await,
        Err(DataError::VirtualTable(_))
    ));
    assert!(matches!(
        service.delete("report", id).await,
        Err(DataError::VirtualTable(_))
    ));
    assert!(matches!(
        service
            .save("report", &GenericEntity::new().with_field("total", Decimal::ONE))
            .await,
        Err(DataError::VirtualTable(_))
    ));
    assert_eq!(storage.sessions_started(), 0);
}

#[tokio::test]
async fn test_resolution_errors() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage.clone());
    let id = EntityId::new(1);

    assert!(matches!(
        service.get("invoice", id).await,
        Err(DataError::SchemaNotFound(kind)) if kind == "invoice"
    ));
    assert!(matches!(
        service.get("a.b.c", id).await,
        Err(DataError::InvalidEntityKind(_))
    ));
    assert!(matches!(
        service.get("note", id).await,
        Err(DataError::UnsupportedField { field, .. }) if field == "body"
    ));
    assert_eq!(storage.sessions_started(), 0);
}

#[tokio::test]
async fn test_unknown_kind_fails_on_every_operation() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage.clone())
        .with_access_config(&AccessConfig { max_page_size: 5 });
    let unknown = |result: Result<(), DataError>| {
        matches!(result, Err(DataError::SchemaNotFound(kind)) if kind == "invoice")
    };

    assert!(unknown(
        service
            .find("invoice", SearchCriteria::first_page(10).unwrap())
            .await
            .map(drop)
    ));
    assert!(unknown(service.delete("invoice", EntityId::new(1)).await));
    assert!(unknown(
        service
            .save("invoice", &GenericEntity::new())
            .await
            .map(drop)
    ));
    assert_eq!(storage.sessions_started(), 0);
}

#[tokio::test]
async fn test_custom_field_kind_rejects_field_access() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    storage
        .seed(
            "notes",
            StoredRecord::new()
                .with("id", 1i64)
                .with("title", "Shift report")
                .with("deleted", false),
        )
        .await;
    let service = service(storage.clone());
    let unsupported = |err: DataError| {
        matches!(err, DataError::UnsupportedField { kind, field } if kind == "note" && field == "body")
    };

    assert!(unsupported(
        service.get("note", EntityId::new(1)).await.unwrap_err()
    ));
    assert!(unsupported(
        service
            .find("note", SearchCriteria::first_page(10).unwrap())
            .await
            .unwrap_err()
    ));
    assert!(unsupported(
        service
            .save("note", &GenericEntity::new().with_field("title", "Draft"))
            .await
            .unwrap_err()
    ));
    assert_eq!(storage.sessions_started(), 0);
}

#[tokio::test]
async fn test_delete_kind_with_custom_field() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    storage
        .seed(
            "notes",
            StoredRecord::new()
                .with("id", 1i64)
                .with("title", "Shift report")
                .with("deleted", false),
        )
        .await;
    let service = service(storage.clone());

    service.delete("note", EntityId::new(1)).await.unwrap();

    let rows = storage.rows("notes").await;
    assert_eq!(rows[0].get("deleted"), Some(&FieldValue::Boolean(true)));
    assert_eq!(rows[0].get("title"), Some(&FieldValue::from("Shift report")));
}

#[tokio::test]
async fn test_save_inserts_and_reads_back() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage.clone());

    let entity = GenericEntity::new()
        .with_field("name", "Gear")
        .with_field("active", true);
    let saved = service.save("widget", &entity).await.unwrap();

    let id = saved.id().expect("saved entity has an id");
    assert_eq!(saved.fields(), entity.fields());
    assert_eq!(service.get("widget", id).await.unwrap(), Some(saved));

    let rows = storage.rows("widgets").await;
    assert_eq!(rows[0].get("deleted"), Some(&FieldValue::Boolean(false)));
}

#[tokio::test]
async fn test_save_updates_present_fields_only() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage);

    let created = service
        .save(
            "widget",
            &GenericEntity::new()
                .with_field("name", "Gear")
                .with_field("active", true),
        )
        .await
        .unwrap();
    let id = created.id().unwrap();

    let updated = service
        .save("widget", &GenericEntity::with_id(id).with_field("active", false))
        .await
        .unwrap();
    assert_eq!(updated.field("name"), Some(&FieldValue::from("Gear")));
    assert_eq!(updated.field("active"), Some(&FieldValue::Boolean(false)));

    let unchanged = service
        .save("widget", &GenericEntity::with_id(id))
        .await
        .unwrap();
    assert_eq!(unchanged, updated);
}

#[tokio::test]
async fn test_save_of_missing_or_deleted_entity_fails() {
    let service = service(seeded_orders().await);

    for id in [2, 42] {
        let entity = GenericEntity::with_id(EntityId::new(id)).with_field("state", "02done");
        assert!(matches!(
            service.save("order", &entity).await,
            Err(DataError::EntityNotFound { id: missing, .. }) if missing.get() == id
        ));
    }
    assert!(matches!(
        service.save("order", &GenericEntity::with_id(EntityId::new(2))).await,
        Err(DataError::EntityNotFound { .. })
    ));
}

#[tokio::test]
async fn test_save_rejects_invalid_entities_without_writing() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage.clone());

    let unknown = GenericEntity::new()
        .with_field("name", "Gear")
        .with_field("color", "red");
    assert!(matches!(
        service.save("widget", &unknown).await,
        Err(DataError::UnknownField { field, .. }) if field == "color"
    ));

    let missing_name = GenericEntity::new().with_field("active", true);
    assert!(matches!(
        service.save("widget", &missing_name).await,
        Err(DataError::MissingRequiredField { field, .. }) if field == "name"
    ));

    let bad_status = GenericEntity::new()
        .with_field("code", "P-1")
        .with_field("status", "99unknown");
    assert!(matches!(
        service.save("product", &bad_status).await,
        Err(DataError::TypeMismatch { field, .. }) if field == "status"
    ));

    assert!(storage.rows("widgets").await.is_empty());
    assert!(storage.rows("products").await.is_empty());
    assert_eq!(storage.sessions_started(), 0);
}

#[tokio::test]
async fn test_restrictions_narrow_page_and_total() {
    let service = service(many_orders(6).await);

    let criteria = SearchCriteria::new(0, 2)
        .unwrap()
        .restrict(Restriction::eq("state", "01pending"));
    let page = service.find("order", criteria).await.unwrap();
    assert_eq!(page.total_count(), 3);
    assert_eq!(ids(page.entities()), vec![1, 3]);

    let criteria = SearchCriteria::first_page(10)
        .unwrap()
        .restrict(Restriction::gt("plannedQuantity", 2i64))
        .restrict(Restriction::like("state", "02%"))
        .order_by(Order::desc("plannedQuantity"));
    let page = service.find("order", criteria).await.unwrap();
    assert_eq!(page.total_count(), 2);
    assert_eq!(ids(page.entities()), vec![6, 4]);

    let criteria = SearchCriteria::first_page(10)
        .unwrap()
        .restrict(Restriction::is_in("state", ["02done"]))
        .restrict(Restriction::le("plannedQuantity", Decimal::from(2)));
    let page = service.find("order", criteria).await.unwrap();
    assert_eq!(ids(page.entities()), vec![2]);
}

#[tokio::test]
async fn test_invalid_criteria() {
    let service = service(many_orders(2).await);

    let unknown = SearchCriteria::first_page(10)
        .unwrap()
        .restrict(Restriction::eq("customer", "ACME"));
    assert!(matches!(
        service.find("order", unknown).await,
        Err(DataError::UnknownField { .. })
    ));

    let limited = service.with_access_config(&AccessConfig { max_page_size: 5 });
    assert!(matches!(
        limited
            .find("order", SearchCriteria::first_page(6).unwrap())
            .await,
        Err(DataError::InvalidCriteria(_))
    ));
    assert_eq!(
        limited
            .find("order", SearchCriteria::first_page(5).unwrap())
            .await
            .unwrap()
            .total_count(),
        2
    );
}

#[tokio::test]
async fn test_custom_deletion_marker_column() {
    init_test_tracing();
    let storage = MemoryStorage::new();
    let service = service(storage.clone());

    let saved = service
        .save(
            "product",
            &GenericEntity::new()
                .with_field("code", "P-1")
                .with_field("status", "01draft"),
        )
        .await
        .unwrap();
    let id = saved.id().unwrap();
    assert_eq!(saved.field("releasedOn"), Some(&FieldValue::Null));

    service.delete("product", id).await.unwrap();
    assert!(service.get("product", id).await.unwrap().is_none());
    let rows = storage.rows("products").await;
    assert_eq!(rows[0].get("removed"), Some(&FieldValue::Boolean(true)));
    assert!(rows[0].get("deleted").is_none());
}
