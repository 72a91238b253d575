use once_cell::sync::Lazy;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::env;

// In-memory SQLite by default; every connection is its own database, so
// the pool is pinned to a single connection.
static DATABASE_URL: Lazy<String> = Lazy::new(|| {
    env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
});

pub async fn setup_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&DATABASE_URL)
        .await
        .expect("Failed to create connection pool");

    chime_sqlite::db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
