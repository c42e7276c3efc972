use chrono::NaiveDate;
use datadef_core::{DataError, DataSourceConfig, EntityId, FieldValue, GenericEntity};
use datadef_data::{
    DataAccessService, Order, Record, Restriction, SearchCriteria, SessionMode, Storage,
    StorageSession,
};
use datadef_data_sqlx::SqlxStorage;
use datadef_test::fixtures::{self, OrderRecord};
use datadef_test::init_test_tracing;
use rust_decimal::Decimal;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        state TEXT,
        "plannedQuantity" DECIMAL,
        deleted BOOLEAN
    )"#,
    r#"CREATE TABLE widgets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        active BOOLEAN,
        "legacyCode" TEXT,
        deleted BOOLEAN
    )"#,
    r#"CREATE TABLE products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        status TEXT,
        "releasedOn" DATE,
        removed BOOLEAN NOT NULL DEFAULT 0
    )"#,
];

async fn storage() -> SqlxStorage {
    init_test_tracing();
    let mut config = DataSourceConfig::new("sqlite::memory:");
    // Every connection to :memory: is a separate database.
    config.max_connections = 1;
    let storage = SqlxStorage::connect(&config).await.unwrap();
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(storage.pool()).await.unwrap();
    }
    storage
}

async fn exec(storage: &SqlxStorage, sql: &str) {
    sqlx::query(sql).execute(storage.pool()).await.unwrap();
}

fn service(storage: &SqlxStorage) -> DataAccessService<SqlxStorage> {
    fixtures::service(storage.clone())
}

fn ids(entities: &[GenericEntity]) -> Vec<i64> {
    entities
        .iter()
        .filter_map(|e| e.id().map(EntityId::get))
        .collect()
}

#[tokio::test]
async fn test_find_skips_soft_deleted_rows() {
    let storage = storage().await;
    exec(
        &storage,
        r#"INSERT INTO orders (id, state, "plannedQuantity", deleted)
           VALUES (1, '01pending', 10.0, 0), (2, NULL, NULL, 1)"#,
    )
    .await;

    let page = service(&storage)
        .find("order", SearchCriteria::new(0, 10).unwrap())
        .await
        .unwrap();

    assert_eq!(page.total_count(), 1);
    assert_eq!(ids(page.entities()), vec![1]);
    assert_eq!(
        page.entities()[0].field("plannedQuantity"),
        Some(&FieldValue::Decimal(Decimal::new(100, 1)))
    );
    assert_eq!(
        page.entities()[0].field("state"),
        Some(&FieldValue::from("01pending"))
    );
}

#[tokio::test]
async fn test_null_marker_counts_as_live() {
    let storage = storage().await;
    exec(
        &storage,
        "INSERT INTO orders (id, state, deleted) VALUES (1, '01pending', NULL)",
    )
    .await;

    let service = service(&storage);
    assert!(service.get("order", EntityId::new(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_flips_marker_only() {
    let storage = storage().await;
    exec(
        &storage,
        "INSERT INTO orders (id, state, deleted) VALUES (1, '01pending', 0)",
    )
    .await;
    let service = service(&storage);
    let id = EntityId::new(1);

    service.delete("order", id).await.unwrap();
    service.delete("order", id).await.unwrap();

    assert!(service.get("order", id).await.unwrap().is_none());
    let (rows, deleted): (i64, i64) = sqlx::query_as("SELECT COUNT(*), SUM(deleted) FROM orders")
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!((rows, deleted), (1, 1));
}

#[tokio::test]
async fn test_boolean_column_holding_text_is_a_type_mismatch() {
    let storage = storage().await;
    exec(
        &storage,
        "INSERT INTO widgets (id, name, active, deleted) VALUES (1, 'Widget', 'yes', 0)",
    )
    .await;

    match service(&storage).get("widget", EntityId::new(1)).await {
        Err(DataError::TypeMismatch {
            record_type,
            field,
            actual,
            ..
        }) => {
            assert_eq!(record_type, "widgets");
            assert_eq!(field, "active");
            assert_eq!(actual, "string");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_boolean_stored_as_integer() {
    let storage = storage().await;
    exec(
        &storage,
        r#"INSERT INTO widgets (id, name, active, "legacyCode", deleted) VALUES (1, 'Widget', 1, 'W-OLD', 0)"#,
    )
    .await;

    let entity = service(&storage)
        .get("widget", EntityId::new(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entity.field("name"), Some(&FieldValue::from("Widget")));
    assert_eq!(entity.field("active"), Some(&FieldValue::Boolean(true)));
    assert_eq!(entity.fields().len(), 2);
}

#[tokio::test]
async fn test_save_round_trip() {
    let storage = storage().await;
    let service = service(&storage);
    let released = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

    let saved = service
        .save(
            "product",
            &GenericEntity::new()
                .with_field("code", "P-1")
                .with_field("status", "02released")
                .with_field("releasedOn", released.clone()),
        )
        .await
        .unwrap();
    let id = saved.id().unwrap();
    assert_eq!(saved.field("releasedOn"), Some(&released));

    let updated = service
        .save("product", &GenericEntity::with_id(id).with_field("status", "03retired"))
        .await
        .unwrap();
    assert_eq!(updated.field("code"), Some(&FieldValue::from("P-1")));
    assert_eq!(updated.field("status"), Some(&FieldValue::from("03retired")));
    assert_eq!(service.get("product", id).await.unwrap(), Some(updated));

    service.delete("product", id).await.unwrap();
    assert!(matches!(
        service
            .save("product", &GenericEntity::with_id(id).with_field("code", "P-2"))
            .await,
        Err(DataError::EntityNotFound { .. })
    ));
}

#[tokio::test]
async fn test_paging_and_restrictions() {
    let storage = storage().await;
    for id in 1..=6 {
        let state = if id % 2 == 0 { "02done" } else { "01pending" };
        exec(
            &storage,
            &format!(
                r#"INSERT INTO orders (id, state, "plannedQuantity", deleted) VALUES ({id}, '{state}', {id}.5, 0)"#
            ),
        )
        .await;
    }
    let service = service(&storage);

    let page = service
        .find("order", SearchCriteria::new(4, 4).unwrap())
        .await
        .unwrap();
    assert_eq!(ids(page.entities()), vec![5, 6]);
    assert_eq!(page.total_count(), 6);

    let empty = service
        .find("order", SearchCriteria::new(50, 4).unwrap())
        .await
        .unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.total_count(), 6);

    let criteria = SearchCriteria::first_page(10)
        .unwrap()
        .restrict(Restriction::like("state", "02%"))
        .restrict(Restriction::gt("plannedQuantity", Decimal::new(25, 1)))
        .order_by(Order::desc("plannedQuantity"));
    let page = service.find("order", criteria).await.unwrap();
    assert_eq!(ids(page.entities()), vec![6, 4]);
    assert_eq!(page.total_count(), 2);
}

#[tokio::test]
async fn test_read_only_session_rejects_writes() {
    let storage = storage().await;
    let record_type = OrderRecord::record_type().unwrap();

    let mut session = storage.begin(SessionMode::ReadOnly).await.unwrap();
    assert!(matches!(
        session.mark_deleted(&record_type, EntityId::new(1)).await,
        Err(DataError::ReadOnlySession(_))
    ));
    session.rollback().await.unwrap();
}

#[tokio::test]
async fn test_failed_save_leaves_no_row() {
    let storage = storage().await;
    let service = service(&storage);

    // Rejected by the mapper before the database sees it.
    let err = service
        .save("widget", &GenericEntity::new().with_field("active", true))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::MissingRequiredField { .. }));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM widgets")
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_decimal_keeps_full_precision_in_text_column() {
    let storage = storage().await;
    exec(&storage, "DROP TABLE orders").await;
    exec(
        &storage,
        r#"CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            state TEXT,
            "plannedQuantity" TEXT,
            deleted BOOLEAN
        )"#,
    )
    .await;
    let service = service(&storage);
    let quantity: Decimal = "1234567890.123456789".parse().unwrap();

    let saved = service
        .save(
            "order",
            &GenericEntity::new()
                .with_field("state", "01pending")
                .with_field("plannedQuantity", quantity),
        )
        .await
        .unwrap();
    assert_eq!(saved.field("plannedQuantity"), Some(&FieldValue::Decimal(quantity)));

    let loaded = service.get("order", saved.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(loaded.field("plannedQuantity"), Some(&FieldValue::Decimal(quantity)));

    let (stored,): (String,) = sqlx::query_as(r#"SELECT "plannedQuantity" FROM orders"#)
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!(stored, "1234567890.123456789");
}

#[tokio::test]
async fn test_delete_kind_with_custom_field() {
    let storage = storage().await;
    exec(
        &storage,
        r#"CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, body TEXT, deleted BOOLEAN)"#,
    )
    .await;
    exec(
        &storage,
        "INSERT INTO notes (id, title, body, deleted) VALUES (1, 'Shift report', 'n/a', 0)",
    )
    .await;

    service(&storage).delete("note", EntityId::new(1)).await.unwrap();

    let (deleted,): (i64,) = sqlx::query_as("SELECT deleted FROM notes WHERE id = 1")
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}
