//! Connection pool and schema migrations.

use sqlx::{
    migrate::{MigrateError, Migrator},
    postgres::PgPoolOptions,
    PgPool,
};
use tracing::info;

const MAX_CONNECTIONS: u32 = 10;

/// Schema of the clusters service.
///
/// Both services may share one database and thus one `_sqlx_migrations`
/// table, so each migrator skips versions applied by the other one.
pub fn clusters_migrator() -> Migrator {
    let mut migrator = sqlx::migrate!("./migrations/clusters");
    migrator.set_ignore_missing(true);
    migrator
}

/// Schema of the customers service. Versions must not collide with
/// [`clusters_migrator`].
pub fn customers_migrator() -> Migrator {
    let mut migrator = sqlx::migrate!("./migrations/customers");
    migrator.set_ignore_missing(true);
    migrator
}

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Applies every pending migration. Must complete before the server accepts
/// traffic.
pub async fn ensure_schema(pool: &PgPool, migrator: &Migrator) -> Result<(), MigrateError> {
    migrator.run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
