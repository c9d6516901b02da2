//! # medstock-db: Entity Store for the Supplies Ledger
//!
//! SQLite storage for departments, catalog, stock buckets and the movement
//! ledger, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Medstock Data Flow                               │
//! │                                                                         │
//! │  consolidate binary / seed binary                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   medstock-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ StockRepo     │    │ 002_links    │  │   │
//! │  │   │ EntityStore   │    │ LedgerRepo    │    │              │  │   │
//! │  │   │               │    │ SettingsRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (medstock.db)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table repositories
//! - [`store`] - The [`EntityStore`] trait used by the consolidation engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medstock_db::{Database, DbConfig};
//! use medstock_core::NewMovement;
//!
//! let db = Database::new(DbConfig::new("medstock.db")).await?;
//!
//! db.ledger().record_movement(&NewMovement::stock_in(1, 5, 10)).await?;
//! let rows = db.stocks().list_for_item(5).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::EntityStore;

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::ledger::{LedgerRepository, TransactionFilter};
pub use repository::settings::SettingsRepository;
pub use repository::stock::StockRepository;
