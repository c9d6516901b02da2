//! # Error Types
//!
//! Domain-specific error types for medstock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medstock-core errors (this file)                                      │
//! │  ├── CoreError        - Domain rule violations, data anomalies         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  medstock-db errors                                                    │
//! │  └── DbError          - Store operation failures                       │
//! │                                                                         │
//! │  medstock-consolidate errors                                           │
//! │  └── ConsolidateError - Fatal run failures                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ConsolidateError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{Id, StockBucket};

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stock data that the model says cannot exist.
    ///
    /// ## When This Occurs
    /// - A stock row references a department that is not registered
    /// - A stock row carries a negative quantity
    /// - Two rows of one item share a (department, expiry) bucket
    ///
    /// The consolidation engine skips the affected slave item when it sees this.
    #[error("Stock anomaly on item {item_id}: {reason}")]
    StockAnomaly { item_id: Id, reason: String },

    /// Not enough stock in a bucket to issue the requested quantity.
    #[error("Insufficient stock for item {item_id} at {bucket}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: Id,
        bucket: StockBucket,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a StockAnomaly error.
    pub fn anomaly(item_id: Id, reason: impl Into<String>) -> Self {
        CoreError::StockAnomaly {
            item_id,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparsable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
