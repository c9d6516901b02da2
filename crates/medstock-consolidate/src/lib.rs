//! # medstock-consolidate: Duplicate-Item Consolidation
//!
//! Folds items registered more than once (name variants such as full-width
//! digits or stray spaces) into a single master item, carrying over category
//! links, stock rows and transaction history.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  consolidate binary (main.rs)                                          │
//! │       │  ConsolidateConfig::load(), Ctrl-C → watch channel             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            medstock-consolidate (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   engine ──► links ──► stock ──► ledger                         │   │
//! │  │     │                                                           │   │
//! │  │     └── BoundedStore (per-call timeout)                         │   │
//! │  └──────────────────────────────┬──────────────────────────────────┘   │
//! │                                 │  dyn EntityStore                      │
//! │                                 ▼                                       │
//! │                      medstock-db (SQLite)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Quantity per (department, expiry) is conserved across a merge
//! - A slave is only deleted once nothing references it
//! - The master ends up linked to every category of every group member
//! - A second run over consolidated data changes nothing

pub mod bounded;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod links;
pub mod report;
pub mod stock;

pub use config::{ConfigError, ConsolidateConfig};
pub use engine::Consolidator;
pub use error::{ConsolidateError, ConsolidateResult};
pub use links::LinkOutcome;
pub use report::{
    ConsolidationReport, GroupReport, MergeStage, PlannedMerge, SkipReason, SlaveOutcome,
    SlaveReport,
};
