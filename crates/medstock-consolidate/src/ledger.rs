//! Transaction reattribution and the pre-deletion reference check.

use medstock_core::Id;
use medstock_db::{DbResult, EntityStore};
use serde::Serialize;
use tracing::debug;

/// Re-points the slave's transaction history at the master.
///
/// A bulk update; running it again after success changes nothing.
pub async fn reattribute(store: &dyn EntityStore, slave_id: Id, master_id: Id) -> DbResult<u64> {
    let rows = store.reattribute_transactions(slave_id, master_id).await?;
    debug!(slave_id, master_id, rows, "Transactions reattributed");
    Ok(rows)
}

/// Rows that still reference an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Residue {
    pub stock_rows: usize,
    pub transactions: i64,
}

impl Residue {
    pub fn is_empty(&self) -> bool {
        self.stock_rows == 0 && self.transactions == 0
    }
}

/// Counts what still points at `item_id` right before deletion.
pub async fn residue(store: &dyn EntityStore, item_id: Id) -> DbResult<Residue> {
    let stock_rows = store.list_stock(item_id).await?.len();
    let transactions = store.count_transactions(item_id).await?;
    Ok(Residue {
        stock_rows,
        transactions,
    })
}
