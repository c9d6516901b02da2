//! # medstock-core: Pure Domain Logic for the Supplies Ledger
//!
//! Entities, duplicate detection and stock merge planning, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Medstock Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              medstock-consolidate (batch job)                   │   │
//! │  │   links ──► stock ──► ledger ──► delete slave                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ medstock-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌───────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │  │  types   │ │ normalize │ │ grouping │ │      merge       │  │   │
//! │  │  │  Item    │ │  name →   │ │  groups  │ │ MasterStockIndex │  │   │
//! │  │  │  Stock   │ │  key      │ │  master  │ │ StockMove        │  │   │
//! │  │  └──────────┘ └───────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │  ┌────────────┐ ┌──────────┐ ┌──────────┐                      │   │
//! │  │  │ validation │ │ reminder │ │  report  │                      │   │
//! │  │  └────────────┘ └──────────┘ └──────────┘                      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 medstock-db (SQLite entity store)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity records (Item, StockRecord, TransactionRecord, ...)
//! - [`normalize`] - Name → duplicate-detection key
//! - [`grouping`] - Duplicate groups and master selection
//! - [`merge`] - Per-row stock migration planning
//! - [`validation`] - Input validation
//! - [`reminder`] - Expiry reminder selection
//! - [`report`] - Usage aggregation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use medstock_core::grouping::{group_by_name, select_master};
//! use medstock_core::Item;
//!
//! let item = |id, name: &str| Item {
//!     id,
//!     name: name.to_string(),
//!     unit: "本".to_string(),
//!     has_expiry: false,
//!     min_stock: 0,
//!     category_id: Some(2),
//! };
//!
//! let groups = group_by_name(vec![item(9, "針１８Ｇ"), item(5, "針18G")]);
//! let selection = select_master(&groups[0]).unwrap();
//!
//! assert_eq!(selection.master.id, 5);
//! assert_eq!(selection.slave_ids(), vec![9]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod grouping;
pub mod merge;
pub mod normalize;
pub mod reminder;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

use chrono::{Datelike, NaiveDate};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length (in characters) of names and remarks.
pub const MAX_NAME_LENGTH: usize = 200;

/// Returns true for `9999-12-31`, which older data uses to mean "no expiry".
pub fn is_no_expiry_sentinel(date: NaiveDate) -> bool {
    date.year() == 9999 && date.month() == 12 && date.day() == 31
}
