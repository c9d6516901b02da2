//! # Stock Reconciliation
//!
//! Applies the per-row plan from [`MasterStockIndex::plan`] through the
//! store. The index is loaded once per group and kept in step with every
//! applied move.
//!
//! A failure part-way leaves the already applied moves in place: each Combine
//! is atomic in the store and a Reassign is a single update, so the next run
//! re-plans from whatever rows the slave still has.

use std::collections::HashSet;

use medstock_core::merge::{MasterStockIndex, StockMove};
use medstock_core::{CoreError, Id};
use medstock_db::{DbError, EntityStore};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Why a slave's stock could not be merged.
#[derive(Debug, Error)]
pub enum StockMergeError {
    #[error(transparent)]
    Store(#[from] DbError),

    /// The slave's (or master's) rows break a stock invariant.
    #[error(transparent)]
    Anomaly(#[from] CoreError),
}

/// Counts of applied stock moves for one slave.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockMergeSummary {
    pub combined: usize,
    pub reassigned: usize,
    pub quantity_moved: i64,
}

/// Reads the master's rows and indexes them by bucket.
pub async fn load_master_index(
    store: &dyn EntityStore,
    master_id: Id,
) -> Result<MasterStockIndex, StockMergeError> {
    let rows = store.list_stock(master_id).await?;
    Ok(MasterStockIndex::new(master_id, rows)?)
}

/// Moves every stock row of `slave_id` into the master.
///
/// Nothing is written when the slave's rows fail validation.
pub async fn merge_slave_stock(
    store: &dyn EntityStore,
    index: &mut MasterStockIndex,
    slave_id: Id,
    known_departments: &HashSet<Id>,
) -> Result<StockMergeSummary, StockMergeError> {
    let rows = store.list_stock(slave_id).await?;
    let moves = index.plan(slave_id, &rows, known_departments)?;

    let mut summary = StockMergeSummary::default();

    for step in &moves {
        match *step {
            StockMove::Combine { from, into, .. } => {
                let moved = store.combine_stock(from, into).await?;
                summary.combined += 1;
                summary.quantity_moved += moved;
            }
            StockMove::Reassign { stock_id, .. } => {
                store.reassign_stock(stock_id, index.master_id()).await?;
                summary.reassigned += 1;
                summary.quantity_moved += step.quantity();
            }
        }
        index.apply(step);

        debug!(
            slave_id,
            master_id = index.master_id(),
            bucket = %step.bucket(),
            quantity = step.quantity(),
            "Stock row merged"
        );
    }

    Ok(summary)
}
