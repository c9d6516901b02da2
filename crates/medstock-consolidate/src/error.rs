//! # Consolidation Errors
//!
//! Only failures that end the whole run live here. Per-slave problems are
//! recorded in the report as [`SlaveOutcome::Skipped`](crate::SlaveOutcome)
//! and never surface as `Err`.
//!
//! ```text
//! DbError (one slave) ──► SlaveOutcome::Skipped, run continues
//! DbError (catalog read, precondition) ──► ConsolidateError, exit status 1
//! ```

use medstock_db::DbError;
use thiserror::Error;

use crate::config::ConfigError;

/// Fatal run failures.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// The many-to-many link table has not been migrated in.
    #[error("Table '{0}' does not exist; apply the item_categories migration first")]
    MissingLinkTable(String),

    /// A store call needed before any per-slave work failed.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type ConsolidateResult<T> = Result<T, ConsolidateError>;
