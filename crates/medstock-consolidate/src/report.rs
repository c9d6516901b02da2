//! # Run Report
//!
//! What a consolidation run did, slave by slave.
//!
//! ## Checkpoints
//! ```text
//! Grouped ──► LinksBackfilled ──┬──► StockMerged ──► TransactionsReattributed ──► SlaveDeleted
//!                               │         (per slave, in ascending id order)
//!                               └──► ... next slave ...                         ──► GroupDone
//! ```
//!
//! A skipped slave records the last checkpoint it reached, so the next run
//! (which starts over from current state) can be compared against it.

use std::fmt;

use medstock_core::Id;
use serde::Serialize;
use tracing::{info, warn};

use crate::links::LinkTally;
use crate::stock::StockMergeSummary;

/// Named checkpoints of a group merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStage {
    Grouped,
    LinksBackfilled,
    StockMerged,
    TransactionsReattributed,
    SlaveDeleted,
    GroupDone,
}

impl fmt::Display for MergeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeStage::Grouped => "grouped",
            MergeStage::LinksBackfilled => "links_backfilled",
            MergeStage::StockMerged => "stock_merged",
            MergeStage::TransactionsReattributed => "transactions_reattributed",
            MergeStage::SlaveDeleted => "slave_deleted",
            MergeStage::GroupDone => "group_done",
        };
        f.write_str(name)
    }
}

/// Why a slave was left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// A store call failed (timeout, pool, constraint).
    StoreFailure { message: String, transient: bool },

    /// The slave's or master's stock data breaks an invariant.
    Anomaly { message: String },

    /// Stock or transactions still referenced the slave right before deletion.
    ReferencesRemain { stock_rows: usize, transactions: i64 },

    /// The master's own legacy category could not be linked.
    MasterLinkMissing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StoreFailure { message, .. } => write!(f, "store failure: {message}"),
            SkipReason::Anomaly { message } => write!(f, "data anomaly: {message}"),
            SkipReason::ReferencesRemain {
                stock_rows,
                transactions,
            } => write!(
                f,
                "still referenced by {stock_rows} stock rows and {transactions} transactions"
            ),
            SkipReason::MasterLinkMissing => write!(f, "master category link missing"),
        }
    }
}

/// Result for one slave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlaveOutcome {
    Merged {
        links: LinkTally,
        stock: StockMergeSummary,
        transactions: u64,
    },
    Skipped {
        reached: MergeStage,
        reason: SkipReason,
    },
}

impl SlaveOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, SlaveOutcome::Merged { .. })
    }

    /// Last checkpoint the slave completed.
    pub fn reached(&self) -> MergeStage {
        match self {
            SlaveOutcome::Merged { .. } => MergeStage::SlaveDeleted,
            SlaveOutcome::Skipped { reached, .. } => *reached,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaveReport {
    pub slave_id: Id,
    pub slave_name: String,
    pub outcome: SlaveOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Normalization key shared by the group.
    pub key: String,
    pub master_id: Id,
    pub master_name: String,
    pub slaves: Vec<SlaveReport>,
}

/// Summary of one consolidation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationReport {
    pub items_scanned: usize,
    /// Groups with two or more members.
    pub groups_found: usize,
    pub links_backfilled: LinkTally,
    pub groups: Vec<GroupReport>,
    pub items_deleted: Vec<Id>,
    /// The run stopped early on a cancellation request.
    pub cancelled: bool,
}

impl ConsolidationReport {
    pub fn slaves(&self) -> impl Iterator<Item = &SlaveReport> {
        self.groups.iter().flat_map(|g| g.slaves.iter())
    }

    pub fn merged_count(&self) -> usize {
        self.slaves().filter(|s| s.outcome.is_merged()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.slaves().filter(|s| !s.outcome.is_merged()).count()
    }

    /// Looks up the outcome for a slave id.
    pub fn outcome_for(&self, slave_id: Id) -> Option<&SlaveOutcome> {
        self.slaves()
            .find(|s| s.slave_id == slave_id)
            .map(|s| &s.outcome)
    }

    /// True when every slave was merged and the run was not cancelled.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped_count() == 0
    }

    pub fn log_summary(&self) {
        for slave in self.slaves() {
            if let SlaveOutcome::Skipped { reached, reason } = &slave.outcome {
                warn!(
                    slave_id = slave.slave_id,
                    slave = %slave.slave_name,
                    reached = %reached,
                    reason = %reason,
                    "Slave left in place"
                );
            }
        }

        info!(
            items_scanned = self.items_scanned,
            groups_found = self.groups_found,
            links_created = self.links_backfilled.created,
            merged = self.merged_count(),
            skipped = self.skipped_count(),
            deleted = self.items_deleted.len(),
            cancelled = self.cancelled,
            "Consolidation finished"
        );
    }
}

/// One duplicate group as it would be merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMerge {
    pub key: String,
    pub master_id: Id,
    pub master_name: String,
    pub slave_ids: Vec<Id>,
    pub slave_names: Vec<String>,
}
