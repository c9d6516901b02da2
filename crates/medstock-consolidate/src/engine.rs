//! # Merge Orchestrator
//!
//! Runs the whole consolidation pass.
//!
//! ## Run Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. link table present?          no  → ConsolidateError (nothing done) │
//! │  2. snapshot items + departments                                       │
//! │  3. group_by_name(items)                                               │
//! │  4. for each group (cancellation checked before each):                 │
//! │     ├── backfill legacy links of every member                          │
//! │     ├── select_master (lowest id)      singleton → next group          │
//! │     └── for each slave, ascending id:                                  │
//! │         ├── link master to slave's categories                          │
//! │         ├── merge stock rows (Combine / Reassign)                      │
//! │         ├── reattribute transactions                                   │
//! │         ├── verify nothing references the slave                        │
//! │         └── delete slave (links + item)                                │
//! │         any failure → SlaveOutcome::Skipped, next slave                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every store call goes through a [`BoundedStore`], so a hung call costs at
//! most `call_timeout` and only the slave it belongs to.

use std::collections::HashSet;
use std::sync::Arc;

use medstock_core::grouping::{group_by_name, select_master, ItemGroup, MasterSelection};
use medstock_core::merge::MasterStockIndex;
use medstock_core::{Id, Item};
use medstock_db::migrations::LINK_TABLE;
use medstock_db::{DbError, EntityStore};
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::bounded::BoundedStore;
use crate::config::ConsolidateConfig;
use crate::error::{ConsolidateError, ConsolidateResult};
use crate::ledger;
use crate::links;
use crate::report::{
    ConsolidationReport, GroupReport, MergeStage, PlannedMerge, SkipReason, SlaveOutcome,
    SlaveReport,
};
use crate::stock::{self, StockMergeError};

/// The duplicate-item consolidation engine.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("medstock.db")).await?;
/// let engine = Consolidator::new(Arc::new(db), &ConsolidateConfig::default());
/// let report = engine.run().await?;
/// ```
pub struct Consolidator {
    store: BoundedStore,
    cancel: Option<watch::Receiver<bool>>,
}

impl Consolidator {
    pub fn new(store: Arc<dyn EntityStore>, config: &ConsolidateConfig) -> Self {
        Consolidator {
            store: BoundedStore::new(store, config.call_timeout),
            cancel: None,
        }
    }

    /// Stops the run before the next group once `true` is sent.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// Lists the merges a run would perform, without writing anything.
    pub async fn plan(&self) -> ConsolidateResult<Vec<PlannedMerge>> {
        let items = self.store.list_items().await?;

        let planned = group_by_name(items)
            .iter()
            .filter_map(|group| {
                select_master(group).map(|selection| PlannedMerge {
                    key: group.key.clone(),
                    master_id: selection.master.id,
                    master_name: selection.master.name.clone(),
                    slave_ids: selection.slave_ids(),
                    slave_names: selection.slaves.iter().map(|s| s.name.clone()).collect(),
                })
            })
            .collect();

        Ok(planned)
    }

    /// Runs one full consolidation pass.
    ///
    /// ## Errors
    /// - `ConsolidateError::MissingLinkTable` before any mutation
    /// - `ConsolidateError::Store` if the initial snapshot cannot be read
    ///
    /// Failures while merging a slave are reported in the returned report.
    pub async fn run(&self) -> ConsolidateResult<ConsolidationReport> {
        if !self.store.link_table_exists().await? {
            return Err(ConsolidateError::MissingLinkTable(LINK_TABLE.to_string()));
        }

        let items = self.store.list_items().await?;
        let known_departments: HashSet<Id> = self
            .store
            .list_departments()
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();

        let mut report = ConsolidationReport {
            items_scanned: items.len(),
            ..Default::default()
        };

        let groups = group_by_name(items);
        report.groups_found = groups.iter().filter(|g| g.is_duplicate()).count();

        info!(
            items = report.items_scanned,
            duplicate_groups = report.groups_found,
            "Starting consolidation"
        );

        for group in &groups {
            if self.is_cancelled() {
                warn!(group = %group.key, "Cancellation requested, stopping before group");
                report.cancelled = true;
                break;
            }

            let span = info_span!("group", key = %group.key);
            if let Some(group_report) = self
                .process_group(group, &known_departments, &mut report)
                .instrument(span)
                .await
            {
                report.groups.push(group_report);
            }
        }

        report.log_summary();
        Ok(report)
    }

    async fn process_group(
        &self,
        group: &ItemGroup,
        known_departments: &HashSet<Id>,
        report: &mut ConsolidationReport,
    ) -> Option<GroupReport> {
        let (tally, failed) = links::backfill_legacy(&self.store, &group.items).await;
        report.links_backfilled.created += tally.created;
        report.links_backfilled.already_present += tally.already_present;
        report.links_backfilled.failed += tally.failed;

        let selection = select_master(group)?;
        let MasterSelection { master, slaves } = &selection;

        info!(
            stage = %MergeStage::LinksBackfilled,
            master_id = master.id,
            slaves = ?selection.slave_ids(),
            "Merging duplicate group"
        );

        let mut group_report = GroupReport {
            key: group.key.clone(),
            master_id: master.id,
            master_name: master.name.clone(),
            slaves: Vec::with_capacity(slaves.len()),
        };

        if failed.contains(&master.id) {
            for slave in slaves {
                group_report.slaves.push(SlaveReport {
                    slave_id: slave.id,
                    slave_name: slave.name.clone(),
                    outcome: SlaveOutcome::Skipped {
                        reached: MergeStage::Grouped,
                        reason: SkipReason::MasterLinkMissing,
                    },
                });
            }
            return Some(group_report);
        }

        let mut index: Option<MasterStockIndex> = None;

        for slave in slaves {
            let outcome = self
                .merge_slave(master, slave, &mut index, known_departments)
                .await;

            match &outcome {
                SlaveOutcome::Merged { .. } => {
                    info!(slave_id = slave.id, stage = %MergeStage::SlaveDeleted, "Slave merged");
                    report.items_deleted.push(slave.id);
                }
                SlaveOutcome::Skipped { reached, reason } => {
                    warn!(slave_id = slave.id, reached = %reached, reason = %reason, "Slave skipped");
                }
            }

            group_report.slaves.push(SlaveReport {
                slave_id: slave.id,
                slave_name: slave.name.clone(),
                outcome,
            });
        }

        debug!(stage = %MergeStage::GroupDone, master_id = master.id, "Group done");
        Some(group_report)
    }

    async fn merge_slave(
        &self,
        master: &Item,
        slave: &Item,
        index: &mut Option<MasterStockIndex>,
        known_departments: &HashSet<Id>,
    ) -> SlaveOutcome {
        let mut reached = MergeStage::LinksBackfilled;

        let links = match links::transfer_links(&self.store, master.id, slave).await {
            Ok(links) => links,
            Err(e) => return skipped(reached, store_failure(e)),
        };

        // Taken out and only put back on success, so a failed merge forces a
        // fresh read of the master's rows for the next slave.
        let mut master_index = match index.take() {
            Some(existing) => existing,
            None => match stock::load_master_index(&self.store, master.id).await {
                Ok(loaded) => loaded,
                Err(e) => return skipped(reached, stock_failure(e)),
            },
        };

        let stock = match stock::merge_slave_stock(
            &self.store,
            &mut master_index,
            slave.id,
            known_departments,
        )
        .await
        {
            Ok(summary) => summary,
            Err(e) => return skipped(reached, stock_failure(e)),
        };
        *index = Some(master_index);
        reached = MergeStage::StockMerged;

        let transactions = match ledger::reattribute(&self.store, slave.id, master.id).await {
            Ok(rows) => rows,
            Err(e) => return skipped(reached, store_failure(e)),
        };
        reached = MergeStage::TransactionsReattributed;

        match ledger::residue(&self.store, slave.id).await {
            Ok(residue) if residue.is_empty() => {}
            Ok(residue) => {
                return skipped(
                    reached,
                    SkipReason::ReferencesRemain {
                        stock_rows: residue.stock_rows,
                        transactions: residue.transactions,
                    },
                )
            }
            Err(e) => return skipped(reached, store_failure(e)),
        }

        if let Err(e) = self.store.delete_item(slave.id).await {
            return skipped(reached, store_failure(e));
        }

        SlaveOutcome::Merged {
            links,
            stock,
            transactions,
        }
    }
}

fn skipped(reached: MergeStage, reason: SkipReason) -> SlaveOutcome {
    SlaveOutcome::Skipped { reached, reason }
}

fn store_failure(e: DbError) -> SkipReason {
    SkipReason::StoreFailure {
        transient: e.is_transient(),
        message: e.to_string(),
    }
}

fn stock_failure(e: StockMergeError) -> SkipReason {
    match e {
        StockMergeError::Store(e) => store_failure(e),
        StockMergeError::Anomaly(e) => SkipReason::Anomaly {
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medstock_core::{Department, NewItem};
    use medstock_db::{Database, DbConfig};

    async fn engine() -> (Database, Consolidator) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
            .insert_department(&Department {
                id: 1,
                name: "警防課".to_string(),
            })
            .await
            .unwrap();
        let engine = Consolidator::new(Arc::new(db.clone()), &ConsolidateConfig::default());
        (db, engine)
    }

    #[tokio::test]
    async fn test_plan_is_read_only() {
        let (db, engine) = engine().await;
        let a = db.catalog().create_item(&NewItem::simple("三角巾", None)).await.unwrap();
        let b = db.catalog().create_item(&NewItem::simple("三角巾 ", None)).await.unwrap();

        let plan = engine.plan().await.unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].master_id, a.id);
        assert_eq!(plan[0].slave_ids, vec![b.id]);
        assert_eq!(db.catalog().count_items().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_group() {
        let (db, engine) = engine().await;
        db.catalog().create_item(&NewItem::simple("三角巾", None)).await.unwrap();
        db.catalog().create_item(&NewItem::simple("三角巾 ", None)).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let engine = engine.with_cancellation(rx);
        tx.send(true).unwrap();

        let report = engine.run().await.unwrap();

        assert!(report.cancelled);
        assert!(report.groups.is_empty());
        assert_eq!(db.catalog().count_items().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let (_db, engine) = engine().await;
        let report = engine.run().await.unwrap();
        assert_eq!(report.items_scanned, 0);
        assert!(report.is_complete());
    }
}
