use datadef::prelude::*;
use datadef_test::fixtures;

const CONFIG: &str = r#"
datadef:
  datasource:
    url: "sqlite::memory:"
    max_connections: 1
  access:
    max_page_size: 2
"#;

async fn connected() -> DataAccessService<SqlxStorage> {
    datadef::init_tracing();
    let config = DatadefConfig::from_yaml_str(CONFIG, "test").unwrap();
    let service = datadef::connect_sqlite(
        &config,
        fixtures::schema_registry(),
        fixtures::record_type_registry(),
    )
    .await
    .unwrap();
    sqlx::query(
        r#"CREATE TABLE orders (id INTEGER PRIMARY KEY AUTOINCREMENT, state TEXT, "plannedQuantity" DECIMAL, deleted BOOLEAN)"#,
    )
    .execute(service.storage().pool())
    .await
    .unwrap();
    service
}

#[tokio::test]
async fn test_connect_applies_access_limits() {
    let service = connected().await;

    assert!(matches!(
        service.find("order", SearchCriteria::first_page(3).unwrap()).await,
        Err(DataError::InvalidCriteria(_))
    ));
    let page = service
        .find("order", SearchCriteria::first_page(2).unwrap())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_save_and_get_through_facade() {
    let service = connected().await;

    let saved = service
        .save("order", &GenericEntity::new().with_field("state", "01pending"))
        .await
        .unwrap();
    let id = saved.id().unwrap();
    assert_eq!(service.get("order", id).await.unwrap(), Some(saved));

    service.delete("order", id).await.unwrap();
    assert_eq!(service.get("order", id).await.unwrap(), None);
}

#[tokio::test]
async fn test_missing_datasource_url_is_a_config_error() {
    let config = DatadefConfig::from_yaml_str("datadef:\n  access:\n    max_page_size: 5\n", "test")
        .unwrap();
    let result = datadef::connect_sqlite(
        &config,
        fixtures::schema_registry(),
        fixtures::record_type_registry(),
    )
    .await;
    assert!(matches!(result, Err(DataError::Config(_))));
}
