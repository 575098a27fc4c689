//! Database tests using temp-file SQLite databases.

mod migrations;

use crate::config::Config;
use crate::db::Database;
use tempfile::TempDir;

/// Open a fresh database in a temp directory, returning the guard so the
/// directory outlives the test.
async fn temp_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let config = Config {
        database_url: format!("sqlite:{}", dir.path().join("test.db").display()),
        ..Config::default()
    };
    let db = Database::new(&config).await.expect("open database");
    (db, dir)
}
