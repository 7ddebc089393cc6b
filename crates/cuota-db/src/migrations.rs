//! # Schema Migrations
//!
//! The ledger schema lives in `migrations/sqlite/` at the workspace root and
//! is compiled into the binary. Opening a [`Database`](crate::Database)
//! applies whatever the file has not seen yet; applied versions are tracked
//! by sqlx in `_sqlx_migrations`.
//!
//! Applied files are checksummed. Editing one after release makes startup
//! fail, so schema changes go in a new `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations in version order, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let embedded = MIGRATOR.migrations.len();
    debug!(embedded, "Applying pending migrations");

    MIGRATOR.run(pool).await?;

    info!(version = latest_version(), "Ledger schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts. Equal once startup succeeded.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}

fn latest_version() -> i64 {
    MIGRATOR.migrations.iter().map(|m| m.version).max().unwrap_or(0)
}
