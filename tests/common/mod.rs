//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use quota_ledger::db::bootstrap_schema;

/// Connect to the test database, bootstrap the schema, and truncate it for
/// a fresh run.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to test database");

    bootstrap_schema(&pool).await.expect("failed to bootstrap schema");

    sqlx::query("TRUNCATE TABLE events, account_current")
        .execute(&pool)
        .await
        .expect("failed to truncate tables");

    pool
}
