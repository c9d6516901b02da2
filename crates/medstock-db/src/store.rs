//! # Entity Store Boundary
//!
//! The typed operations the consolidation engine needs, behind a trait so the
//! engine never sees SQL. [`Database`] implements it over its repositories;
//! tests wrap it to inject faults.
//!
//! ```text
//! medstock-consolidate ──► dyn EntityStore ──► Database ──► repositories ──► SQLite
//! ```

use async_trait::async_trait;

use crate::error::DbResult;
use crate::migrations::{self, LINK_TABLE};
use crate::pool::Database;
use medstock_core::{Department, Id, Item, ItemCategoryLink, StockRecord};

/// Store operations used by duplicate-item consolidation.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Whether the item ↔ category link table exists.
    async fn link_table_exists(&self) -> DbResult<bool>;

    async fn list_departments(&self) -> DbResult<Vec<Department>>;

    /// All items in id order.
    async fn list_items(&self) -> DbResult<Vec<Item>>;

    async fn list_links(&self, item_id: Id) -> DbResult<Vec<ItemCategoryLink>>;

    /// Creates a link. An existing pair fails with `DbError::UniqueViolation`.
    async fn create_link(&self, item_id: Id, category_id: Id) -> DbResult<()>;

    async fn list_stock(&self, item_id: Id) -> DbResult<Vec<StockRecord>>;

    /// Atomically adds row `from` into row `into` and deletes `from`.
    async fn combine_stock(&self, from: Id, into: Id) -> DbResult<i64>;

    /// Re-points a stock row at another item.
    async fn reassign_stock(&self, stock_id: Id, item_id: Id) -> DbResult<()>;

    /// Re-points all transactions of `from_item`; returns rows changed.
    async fn reattribute_transactions(&self, from_item: Id, to_item: Id) -> DbResult<u64>;

    async fn count_transactions(&self, item_id: Id) -> DbResult<i64>;

    /// Deletes an item together with its link rows.
    async fn delete_item(&self, item_id: Id) -> DbResult<()>;
}

#[async_trait]
impl EntityStore for Database {
    async fn link_table_exists(&self) -> DbResult<bool> {
        migrations::table_exists(self.pool(), LINK_TABLE).await
    }

    async fn list_departments(&self) -> DbResult<Vec<Department>> {
        self.catalog().list_departments().await
    }

    async fn list_items(&self) -> DbResult<Vec<Item>> {
        self.catalog().list_items().await
    }

    async fn list_links(&self, item_id: Id) -> DbResult<Vec<ItemCategoryLink>> {
        self.catalog().links_for_item(item_id).await
    }

    async fn create_link(&self, item_id: Id, category_id: Id) -> DbResult<()> {
        self.catalog().link_item(item_id, category_id).await?;
        Ok(())
    }

    async fn list_stock(&self, item_id: Id) -> DbResult<Vec<StockRecord>> {
        self.stocks().list_for_item(item_id).await
    }

    async fn combine_stock(&self, from: Id, into: Id) -> DbResult<i64> {
        self.stocks().combine(from, into).await
    }

    async fn reassign_stock(&self, stock_id: Id, item_id: Id) -> DbResult<()> {
        self.stocks().reassign(stock_id, item_id).await
    }

    async fn reattribute_transactions(&self, from_item: Id, to_item: Id) -> DbResult<u64> {
        self.ledger().reattribute(from_item, to_item).await
    }

    async fn count_transactions(&self, item_id: Id) -> DbResult<i64> {
        self.ledger().count_for_item(item_id).await
    }

    async fn delete_item(&self, item_id: Id) -> DbResult<()> {
        self.catalog().delete_item(item_id).await
    }
}
