//! Deadline wrapper around an [`EntityStore`].
//!
//! Every call is raced against `tokio::time::timeout`; an expired call
//! becomes `DbError::Timeout`, which the engine treats as transient. No call
//! is retried here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use medstock_core::{Department, Id, Item, ItemCategoryLink, StockRecord};
use medstock_db::{DbError, DbResult, EntityStore};
use tracing::warn;

/// An [`EntityStore`] whose calls each complete within `limit` or fail.
#[derive(Clone)]
pub struct BoundedStore {
    inner: Arc<dyn EntityStore>,
    limit: Duration,
}

impl BoundedStore {
    pub fn new(inner: Arc<dyn EntityStore>, limit: Duration) -> Self {
        BoundedStore { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = DbResult<T>> + Send,
    ) -> DbResult<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, limit = ?self.limit, "Store call timed out");
                Err(DbError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl EntityStore for BoundedStore {
    async fn link_table_exists(&self) -> DbResult<bool> {
        self.bounded("link_table_exists", self.inner.link_table_exists())
            .await
    }

    async fn list_departments(&self) -> DbResult<Vec<Department>> {
        self.bounded("list_departments", self.inner.list_departments())
            .await
    }

    async fn list_items(&self) -> DbResult<Vec<Item>> {
        self.bounded("list_items", self.inner.list_items()).await
    }

    async fn list_links(&self, item_id: Id) -> DbResult<Vec<ItemCategoryLink>> {
        self.bounded("list_links", self.inner.list_links(item_id))
            .await
    }

    async fn create_link(&self, item_id: Id, category_id: Id) -> DbResult<()> {
        self.bounded("create_link", self.inner.create_link(item_id, category_id))
            .await
    }

    async fn list_stock(&self, item_id: Id) -> DbResult<Vec<StockRecord>> {
        self.bounded("list_stock", self.inner.list_stock(item_id))
            .await
    }

    async fn combine_stock(&self, from: Id, into: Id) -> DbResult<i64> {
        self.bounded("combine_stock", self.inner.combine_stock(from, into))
            .await
    }

    async fn reassign_stock(&self, stock_id: Id, item_id: Id) -> DbResult<()> {
        self.bounded("reassign_stock", self.inner.reassign_stock(stock_id, item_id))
            .await
    }

    async fn reattribute_transactions(&self, from_item: Id, to_item: Id) -> DbResult<u64> {
        self.bounded(
            "reattribute_transactions",
            self.inner.reattribute_transactions(from_item, to_item),
        )
        .await
    }

    async fn count_transactions(&self, item_id: Id) -> DbResult<i64> {
        self.bounded("count_transactions", self.inner.count_transactions(item_id))
            .await
    }

    async fn delete_item(&self, item_id: Id) -> DbResult<()> {
        self.bounded("delete_item", self.inner.delete_item(item_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Never answers.
    struct Hanging;

    #[async_trait]
    impl EntityStore for Hanging {
        async fn link_table_exists(&self) -> DbResult<bool> {
            std::future::pending().await
        }
        async fn list_departments(&self) -> DbResult<Vec<Department>> {
            Ok(vec![])
        }
        async fn list_items(&self) -> DbResult<Vec<Item>> {
            std::future::pending().await
        }
        async fn list_links(&self, _: Id) -> DbResult<Vec<ItemCategoryLink>> {
            Ok(vec![])
        }
        async fn create_link(&self, _: Id, _: Id) -> DbResult<()> {
            Ok(())
        }
        async fn list_stock(&self, _: Id) -> DbResult<Vec<StockRecord>> {
            Ok(vec![])
        }
        async fn combine_stock(&self, _: Id, _: Id) -> DbResult<i64> {
            Ok(0)
        }
        async fn reassign_stock(&self, _: Id, _: Id) -> DbResult<()> {
            Ok(())
        }
        async fn reattribute_transactions(&self, _: Id, _: Id) -> DbResult<u64> {
            Ok(0)
        }
        async fn count_transactions(&self, _: Id) -> DbResult<i64> {
            Ok(0)
        }
        async fn delete_item(&self, _: Id) -> DbResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hanging_call_times_out() {
        let store = BoundedStore::new(Arc::new(Hanging), Duration::from_millis(20));

        let err = store.list_items().await.unwrap_err();
        assert!(matches!(err, DbError::Timeout(d) if d == Duration::from_millis(20)));
        assert!(err.is_transient());

        assert!(store.list_departments().await.unwrap().is_empty());
    }
}
