//! # Domain Types
//!
//! Typed records for every table of the stock ledger.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stock Ledger Entities                           │
//! │                                                                         │
//! │  ┌──────────────┐        ┌──────────────────┐       ┌──────────────┐   │
//! │  │  Category    │◄───────│ ItemCategoryLink │──────►│    Item      │   │
//! │  │  id, name    │  M:N   │ item_id          │       │  id, name    │   │
//! │  │  icon        │        │ category_id      │       │  unit        │   │
//! │  └──────────────┘        └──────────────────┘       │  category_id │   │
//! │                                                     │  (legacy)    │   │
//! │                                                     └──────┬───────┘   │
//! │                                      ┌─────────────────────┤           │
//! │                                      ▼                     ▼           │
//! │  ┌──────────────┐        ┌──────────────────┐   ┌──────────────────┐  │
//! │  │ Department   │◄───────│   StockRecord    │   │TransactionRecord │  │
//! │  │ id, name     │        │ (dept,item,exp)  │   │ IN / OUT, qty    │  │
//! │  │ (immutable)  │        │ quantity >= 0    │   │ append-only      │  │
//! │  └──────────────┘        └──────────────────┘   └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! All identifiers are store-assigned integers. The consolidation engine relies
//! on their ordering: the lowest id in a duplicate group survives.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Store-assigned identifier.
pub type Id = i64;

// =============================================================================
// Reference Entities
// =============================================================================

/// A department (station) holding its own stock. Seeded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Department {
    pub id: Id,
    pub name: String,
}

/// A category items can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: Id,
    pub name: String,
    /// Icon identifier used by the category grid.
    pub icon: String,
}

// =============================================================================
// Item
// =============================================================================

/// A consumable supply item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub id: Id,

    /// Display name. Name variants of one physical item are what the
    /// consolidation engine folds together.
    pub name: String,

    /// Unit of measure ("個", "本", "箱", ...).
    pub unit: String,

    /// Whether stock of this item is tracked per expiry date.
    pub has_expiry: bool,

    /// Minimum stock threshold per department.
    pub min_stock: i64,

    /// Deprecated single-category reference. Superseded by
    /// [`ItemCategoryLink`] but still read during consolidation.
    pub category_id: Option<Id>,
}

/// Fields for creating an item (id is assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub unit: String,
    pub has_expiry: bool,
    pub min_stock: i64,
    pub category_id: Option<Id>,
}

impl NewItem {
    /// An item counted in pieces, without expiry tracking.
    pub fn simple(name: impl Into<String>, category_id: Option<Id>) -> Self {
        NewItem {
            name: name.into(),
            unit: "個".to_string(),
            has_expiry: false,
            min_stock: 0,
            category_id,
        }
    }
}

/// Many-to-many association between items and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemCategoryLink {
    pub item_id: Id,
    pub category_id: Id,
}

// =============================================================================
// Stock
// =============================================================================

/// The key of a stock row within one item: department plus expiry.
///
/// `expiry_date == None` is the "no expiry" bucket and is distinct from every
/// dated bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockBucket {
    pub department_id: Id,
    pub expiry_date: Option<NaiveDate>,
}

impl StockBucket {
    pub fn new(department_id: Id, expiry_date: Option<NaiveDate>) -> Self {
        StockBucket {
            department_id,
            expiry_date,
        }
    }
}

impl fmt::Display for StockBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expiry_date {
            Some(date) => write!(f, "dept{}/{}", self.department_id, date),
            None => write!(f, "dept{}/no-expiry", self.department_id),
        }
    }
}

/// Quantity of one item held by one department in one expiry bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockRecord {
    pub id: Id,
    pub department_id: Id,
    pub item_id: Id,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i64,
}

impl StockRecord {
    /// Returns the (department, expiry) bucket of this row.
    #[inline]
    pub fn bucket(&self) -> StockBucket {
        StockBucket::new(self.department_id, self.expiry_date)
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Stock received.
    In,
    /// Stock used or issued.
    Out,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::In => write!(f, "IN"),
            TransactionType::Out => write!(f, "OUT"),
        }
    }
}

/// One row of the append-only movement ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionRecord {
    pub id: Id,
    pub department_id: Id,
    pub item_id: Id,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

/// A stock movement to be applied to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub department_id: Id,
    pub item_id: Id,
    pub kind: TransactionType,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

impl NewMovement {
    /// Stock-in of `quantity` units.
    pub fn stock_in(department_id: Id, item_id: Id, quantity: i64) -> Self {
        NewMovement {
            department_id,
            item_id,
            kind: TransactionType::In,
            quantity,
            expiry_date: None,
            remarks: None,
        }
    }

    /// Stock-out of `quantity` units.
    pub fn stock_out(department_id: Id, item_id: Id, quantity: i64) -> Self {
        NewMovement {
            department_id,
            item_id,
            kind: TransactionType::Out,
            quantity,
            expiry_date: None,
            remarks: None,
        }
    }

    /// Sets the expiry bucket the movement applies to.
    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// Attaches a free-text remark.
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_display() {
        let dated = StockBucket::new(1, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(dated.to_string(), "dept1/2026-01-01");

        let undated = StockBucket::new(3, None);
        assert_eq!(undated.to_string(), "dept3/no-expiry");
    }

    #[test]
    fn test_no_expiry_bucket_is_distinct() {
        let dated = StockBucket::new(1, NaiveDate::from_ymd_opt(2026, 1, 1));
        let undated = StockBucket::new(1, None);
        assert_ne!(dated, undated);
    }

    #[test]
    fn test_transaction_type_serde() {
        let json = serde_json::to_string(&TransactionType::Out).unwrap();
        assert_eq!(json, "\"OUT\"");
        let parsed: TransactionType = serde_json::from_str("\"IN\"").unwrap();
        assert_eq!(parsed, TransactionType::In);
    }

    #[test]
    fn test_movement_builder() {
        let date = NaiveDate::from_ymd_opt(2027, 3, 31).unwrap();
        let movement = NewMovement::stock_in(2, 40, 5)
            .with_expiry(date)
            .with_remarks("delivery");

        assert_eq!(movement.kind, TransactionType::In);
        assert_eq!(movement.expiry_date, Some(date));
        assert_eq!(movement.remarks.as_deref(), Some("delivery"));
    }
}
