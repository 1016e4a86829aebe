//! Schema migrations for the user management service

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, migrate::Migrator};
use tracing::info;

/// Embedded migrations from `services/users/migrations`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    info!("Applying database migrations");

    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    info!("Database migrations applied");
    Ok(())
}
