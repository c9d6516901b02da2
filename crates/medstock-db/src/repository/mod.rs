//! # Repository Module
//!
//! Per-table database access for the supplies ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (seed, engine, tests)                                          │
//! │       │                                                                 │
//! │       │  db.stocks().list_for_item(5)                                  │
//! │       ▼                                                                 │
//! │  StockRepository                                                       │
//! │  ├── list_for_item(&self, item_id)                                     │
//! │  ├── find_bucket(&self, dept, item, expiry)                            │
//! │  ├── combine(&self, from, into)        (atomic)                        │
//! │  └── reassign(&self, stock_id, item_id)                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Departments, categories, items, links
//! - [`StockRepository`](stock::StockRepository) - Stock buckets and merge primitives
//! - [`LedgerRepository`](ledger::LedgerRepository) - Movements and transaction history
//! - [`SettingsRepository`](settings::SettingsRepository) - System settings

pub mod catalog;
pub mod ledger;
pub mod settings;
pub mod stock;
