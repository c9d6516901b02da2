//! # Stock Merge Planning
//!
//! Decides, row by row, how a slave item's stock moves into its master.
//!
//! ## Decision Per Slave Row
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  slave row S (dept, slave, expiry, qty)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MasterStockIndex lookup by StockBucket (dept, expiry)  ← O(1)          │
//! │       │                                                                 │
//! │       ├── found M  ──► Combine  { M.qty += S.qty ; delete S }           │
//! │       │                 (applied atomically by the store)               │
//! │       │                                                                 │
//! │       └── missing  ──► Reassign { S.item_id := master }                 │
//! │                                                                         │
//! │  Per bucket: Σ qty(master ∪ slaves) before == Σ qty(master) after       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index is built once per group from the master's rows and updated
//! after every applied move, so sibling slaves see buckets created by earlier
//! reassignments.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{CoreError, CoreResult};
use crate::types::{Id, StockBucket, StockRecord};

/// One step of a stock migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockMove {
    /// Add the slave row's quantity to the master row, then delete the slave row.
    Combine {
        from: Id,
        into: Id,
        bucket: StockBucket,
        quantity: i64,
    },
    /// Re-point the slave row at the master item.
    Reassign {
        stock_id: Id,
        bucket: StockBucket,
        quantity: i64,
    },
}

impl StockMove {
    pub fn bucket(&self) -> StockBucket {
        match self {
            StockMove::Combine { bucket, .. } | StockMove::Reassign { bucket, .. } => *bucket,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            StockMove::Combine { quantity, .. } | StockMove::Reassign { quantity, .. } => *quantity,
        }
    }
}

/// The master item's stock rows keyed by bucket.
#[derive(Debug, Clone)]
pub struct MasterStockIndex {
    master_id: Id,
    rows: HashMap<StockBucket, StockRecord>,
}

impl MasterStockIndex {
    /// Indexes the master's rows.
    ///
    /// ## Errors
    /// `CoreError::StockAnomaly` if a row belongs to another item or two rows
    /// share a bucket.
    pub fn new(master_id: Id, rows: Vec<StockRecord>) -> CoreResult<Self> {
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            if row.item_id != master_id {
                return Err(CoreError::anomaly(
                    master_id,
                    format!("stock row {} belongs to item {}", row.id, row.item_id),
                ));
            }
            let bucket = row.bucket();
            if index.insert(bucket, row).is_some() {
                return Err(CoreError::anomaly(
                    master_id,
                    format!("duplicate stock bucket {bucket}"),
                ));
            }
        }

        Ok(MasterStockIndex {
            master_id,
            rows: index,
        })
    }

    pub fn master_id(&self) -> Id {
        self.master_id
    }

    pub fn get(&self, bucket: &StockBucket) -> Option<&StockRecord> {
        self.rows.get(bucket)
    }

    /// Plans the migration of one slave's rows.
    ///
    /// Every row is checked before any move is produced, so an anomaly on
    /// one row yields no plan at all.
    ///
    /// ## Errors
    /// `CoreError::StockAnomaly` when a row references an unknown department,
    /// has a negative quantity, belongs to a different item, or repeats a
    /// bucket.
    pub fn plan(
        &self,
        slave_id: Id,
        slave_rows: &[StockRecord],
        known_departments: &HashSet<Id>,
    ) -> CoreResult<Vec<StockMove>> {
        let mut seen = HashSet::with_capacity(slave_rows.len());

        for row in slave_rows {
            if row.item_id != slave_id {
                return Err(CoreError::anomaly(
                    slave_id,
                    format!("stock row {} belongs to item {}", row.id, row.item_id),
                ));
            }
            if !known_departments.contains(&row.department_id) {
                return Err(CoreError::anomaly(
                    slave_id,
                    format!("stock row {} references unknown department {}", row.id, row.department_id),
                ));
            }
            if row.quantity < 0 {
                return Err(CoreError::anomaly(
                    slave_id,
                    format!("stock row {} has negative quantity {}", row.id, row.quantity),
                ));
            }
            if !seen.insert(row.bucket()) {
                return Err(CoreError::anomaly(
                    slave_id,
                    format!("duplicate stock bucket {}", row.bucket()),
                ));
            }
        }

        let moves = slave_rows
            .iter()
            .map(|row| {
                let bucket = row.bucket();
                match self.rows.get(&bucket) {
                    Some(master_row) => StockMove::Combine {
                        from: row.id,
                        into: master_row.id,
                        bucket,
                        quantity: row.quantity,
                    },
                    None => StockMove::Reassign {
                        stock_id: row.id,
                        bucket,
                        quantity: row.quantity,
                    },
                }
            })
            .collect();

        Ok(moves)
    }

    /// Records a move that the store has applied.
    pub fn apply(&mut self, step: &StockMove) {
        match *step {
            StockMove::Combine {
                bucket, quantity, ..
            } => {
                if let Some(row) = self.rows.get_mut(&bucket) {
                    row.quantity += quantity;
                }
            }
            StockMove::Reassign {
                stock_id,
                bucket,
                quantity,
            } => {
                self.rows.insert(
                    bucket,
                    StockRecord {
                        id: stock_id,
                        department_id: bucket.department_id,
                        item_id: self.master_id,
                        expiry_date: bucket.expiry_date,
                        quantity,
                    },
                );
            }
        }
    }

    /// Per-bucket quantities currently held by the master.
    pub fn totals(&self) -> BTreeMap<StockBucket, i64> {
        self.rows
            .iter()
            .map(|(bucket, row)| (*bucket, row.quantity))
            .collect()
    }
}

/// Sums quantities per bucket across any set of rows.
pub fn bucket_totals<'a>(rows: impl IntoIterator<Item = &'a StockRecord>) -> BTreeMap<StockBucket, i64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals.entry(row.bucket()).or_insert(0) += row.quantity;
    }
    totals
}
