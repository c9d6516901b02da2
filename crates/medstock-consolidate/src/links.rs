//! # Category Link Migration
//!
//! Moves category membership from the legacy `items.category_id` column into
//! the link table, and carries a slave's categories over to its master.
//!
//! ```text
//! create_link(item, category)
//!   ├── Ok                  → LinkOutcome::Created
//!   ├── UniqueViolation     → LinkOutcome::AlreadyPresent   (benign)
//!   └── any other DbError   → Err (caller decides)
//! ```

use std::collections::BTreeSet;

use medstock_core::{Id, Item};
use medstock_db::{DbResult, EntityStore};
use serde::Serialize;
use tracing::{debug, warn};

/// Result of one link attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    Created,
    AlreadyPresent,
}

/// Tally of a link backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkTally {
    pub created: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl LinkTally {
    fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Created => self.created += 1,
            LinkOutcome::AlreadyPresent => self.already_present += 1,
        }
    }
}

/// Links `item_id` to `category_id`, treating an existing link as success.
pub async fn ensure_link(
    store: &dyn EntityStore,
    item_id: Id,
    category_id: Id,
) -> DbResult<LinkOutcome> {
    match store.create_link(item_id, category_id).await {
        Ok(()) => {
            debug!(item_id, category_id, "Link created");
            Ok(LinkOutcome::Created)
        }
        Err(e) if e.is_unique_violation() => {
            debug!(item_id, category_id, "Link already present");
            Ok(LinkOutcome::AlreadyPresent)
        }
        Err(e) => Err(e),
    }
}

/// Creates the explicit link for every item that still carries a legacy
/// category.
///
/// Failures are logged and counted; they never stop the pass. Returns the
/// ids of items whose backfill failed alongside the tally.
pub async fn backfill_legacy(store: &dyn EntityStore, items: &[Item]) -> (LinkTally, Vec<Id>) {
    let mut tally = LinkTally::default();
    let mut failed = Vec::new();

    for item in items {
        let Some(category_id) = item.category_id else {
            continue;
        };

        match ensure_link(store, item.id, category_id).await {
            Ok(outcome) => tally.record(outcome),
            Err(e) => {
                warn!(item_id = item.id, category_id, error = %e, "Link backfill failed");
                tally.failed += 1;
                failed.push(item.id);
            }
        }
    }

    (tally, failed)
}

/// Every category a slave belongs to: its legacy reference plus its
/// explicit links.
pub async fn slave_categories(store: &dyn EntityStore, slave: &Item) -> DbResult<BTreeSet<Id>> {
    let mut categories: BTreeSet<Id> = store
        .list_links(slave.id)
        .await?
        .into_iter()
        .map(|link| link.category_id)
        .collect();
    categories.extend(slave.category_id);
    Ok(categories)
}

/// Links the master to every category of the slave.
///
/// Stops at the first non-benign failure.
pub async fn transfer_links(
    store: &dyn EntityStore,
    master_id: Id,
    slave: &Item,
) -> DbResult<LinkTally> {
    let mut tally = LinkTally::default();

    for category_id in slave_categories(store, slave).await? {
        let outcome = ensure_link(store, master_id, category_id).await?;
        tally.record(outcome);
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medstock_core::NewItem;
    use medstock_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_ensure_link_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = db.catalog().create_category("資機材", "🩺").await.unwrap();
        let item = db
            .catalog()
            .create_item(&NewItem::simple("三方活栓", Some(cat.id)))
            .await
            .unwrap();

        assert_eq!(ensure_link(&db, item.id, cat.id).await.unwrap(), LinkOutcome::Created);
        assert_eq!(
            ensure_link(&db, item.id, cat.id).await.unwrap(),
            LinkOutcome::AlreadyPresent
        );
    }

    #[tokio::test]
    async fn test_backfill_skips_items_without_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = db.catalog().create_category("消耗品", "🩹").await.unwrap();
        let with = db
            .catalog()
            .create_item(&NewItem::simple("三角巾", Some(cat.id)))
            .await
            .unwrap();
        let without = db
            .catalog()
            .create_item(&NewItem::simple("弾性包帯", None))
            .await
            .unwrap();

        let (tally, failed) = backfill_legacy(&db, &[with.clone(), without]).await;
        assert_eq!(tally.created, 1);
        assert!(failed.is_empty());

        let (tally, _) = backfill_legacy(&db, &[with]).await;
        assert_eq!(tally.already_present, 1);
    }

    #[tokio::test]
    async fn test_transfer_includes_explicit_links() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db.catalog().create_category("資機材", "🩺").await.unwrap();
        let b = db.catalog().create_category("その他", "📦").await.unwrap();
        let master = db
            .catalog()
            .create_item(&NewItem::simple("SpO2センサー", Some(a.id)))
            .await
            .unwrap();
        let slave = db
            .catalog()
            .create_item(&NewItem::simple("ＳｐＯ２センサー", None))
            .await
            .unwrap();
        db.catalog().link_item(slave.id, b.id).await.unwrap();

        let tally = transfer_links(&db, master.id, &slave).await.unwrap();

        assert_eq!(tally.created, 1);
        let linked: Vec<Id> = db
            .catalog()
            .links_for_item(master.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.category_id)
            .collect();
        assert_eq!(linked, vec![b.id]);
    }
}
