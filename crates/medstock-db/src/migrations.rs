//! # Database Migrations
//!
//! Embedded SQL migrations for the supplies ledger.
//!
//! ## Migration Set
//! ```text
//! migrations/sqlite/
//! ├── 001_initial_schema.sql   departments, categories, items,
//! │                            stocks, transactions, system_settings
//! └── 002_item_categories.sql  many-to-many item ↔ category links
//! ```
//!
//! Databases created before 002 still carry only `items.category_id`; the
//! consolidation engine refuses to run against such a schema because it
//! needs the link table to preserve category membership.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Name of the many-to-many association table.
pub const LINK_TABLE: &str = "item_categories";

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent: already-applied migrations are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns (total_migrations, applied_migrations). For diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

/// Checks whether a table exists in the connected schema.
pub async fn table_exists(pool: &SqlitePool, table: &str) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}
