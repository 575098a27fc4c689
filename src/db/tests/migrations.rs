use super::temp_db;
use crate::db::Database;

#[tokio::test]
async fn new_database_creates_schema() {
    let (db, _dir) = temp_db().await;

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();

    assert!(tables.contains(&"records".to_string()));
    assert!(tables.contains(&"schema_version".to_string()));
}

#[tokio::test]
async fn schema_version_is_recorded() {
    let (db, _dir) = temp_db().await;

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(db.pool())
        .await
        .unwrap();

    assert_eq!(version, 1);
}

#[tokio::test]
async fn reopening_is_idempotent() {
    let (db, dir) = temp_db().await;
    db.seed_records(5).await.unwrap();
    db.close().await;

    let config = crate::config::Config {
        database_url: format!("sqlite:{}", dir.path().join("test.db").display()),
        ..crate::config::Config::default()
    };
    let db = Database::new(&config).await.unwrap();

    // Migration must not re-run and wipe existing rows
    assert_eq!(db.count_records().await.unwrap(), 5);

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(version, 1);
}

#[tokio::test]
async fn records_table_has_declared_columns() {
    let (db, _dir) = temp_db().await;

    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('records')")
        .fetch_all(db.pool())
        .await
        .unwrap();

    for (name, _) in crate::db::RECORD_COLUMNS {
        assert!(columns.contains(&name.to_string()), "missing column {name}");
    }
}

#[tokio::test]
async fn health_check_succeeds_on_open_database() {
    let (db, _dir) = temp_db().await;
    db.health_check().await.unwrap();
}
