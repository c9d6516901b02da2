//! # Opening the Ledger Database
//!
//! One SQLite file holds the whole ledger: catalog, stock rows, the
//! transaction log and settings. The station screens keep writing to it
//! while the seed or consolidate binaries run, so connections wait on a
//! locked file for `busy_timeout` instead of failing at once.
//!
//! ```text
//!   DbConfig::new("medstock.db")          DbConfig::in_memory()
//!            │                                     │
//!            └──────────────┬──────────────────────┘
//!                           ▼
//!                Database::new(config)
//!                  ├── WAL journal, foreign keys on
//!                  └── migrations (unless disabled)
//!                           │
//!        ┌────────────┬─────┴──────┬──────────────┐
//!        ▼            ▼            ▼              ▼
//!    catalog()     stocks()     ledger()     settings()
//!
//!    impl EntityStore for Database   (store.rs)
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::ledger::LedgerRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::stock::StockRepository;

/// Where the ledger lives and how to connect to it.
///
/// ```rust,ignore
/// // The consolidate binary: schema must already be in place
/// let config = DbConfig::new("./medstock.db")
///     .run_migrations(false)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Upper bound on pooled connections (default 4).
    pub max_connections: u32,

    /// How long a statement waits for another writer's lock (default 5 s).
    pub busy_timeout: Duration,

    /// Apply pending migrations on open (default true).
    pub run_migrations: bool,
}

impl DbConfig {
    /// A file-backed ledger, created if absent.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A private, migrated in-memory ledger.
    ///
    /// Every connection to `:memory:` would see its own empty database, so
    /// the pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            ..DbConfig::new(":memory:")
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

/// Handle to the ledger database.
///
/// Clones share one pool. Repository handles are created per call.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the ledger and, when configured, brings the schema up to date.
    ///
    /// Foreign keys are switched on for every connection: deleting an item
    /// that still has stock or transactions must fail.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening ledger database");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            busy_timeout = ?config.busy_timeout,
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Ledger schema up to date");
        Ok(())
    }

    /// Raw pool, for fixtures and one-off queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Departments, categories, items and their category links.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    /// Stock rows per (department, item, expiry).
    pub fn stocks(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// Stock movements and the transaction log.
    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        debug!("Closing ledger database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
