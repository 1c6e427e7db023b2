//! PostgreSQL pool and schema for the organization store.
//!
//! The database only answers "which organization is this slug, and what are
//! its processor references". Card and bank data never land here.

use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

/// Connect the pool behind `PgOrganizationStore`.
///
/// Each billing request does one slug lookup and, on a first card update, one
/// `processor_card_key` write, so five connections are plenty.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Create or upgrade the `organizations` table.
///
/// Migrations are embedded at compile time from `migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
