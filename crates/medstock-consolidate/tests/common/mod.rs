//! Shared fixtures for consolidation tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use medstock_consolidate::ConsolidateConfig;
use medstock_core::{Department, Id, Item, ItemCategoryLink, NewMovement, StockRecord};
use medstock_db::{Database, DbConfig, DbResult, EntityStore, TransactionFilter};

pub const CALL_TIMEOUT: Duration = Duration::from_millis(200);

pub fn config() -> ConsolidateConfig {
    ConsolidateConfig::default().call_timeout(CALL_TIMEOUT)
}

/// In-memory database with departments 1..=3 and categories 1..=3.
pub async fn database() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for (id, name) in [(1, "警防課"), (2, "三次"), (3, "庄原")] {
        db.catalog()
            .insert_department(&Department {
                id,
                name: name.to_string(),
            })
            .await
            .unwrap();
    }
    for (id, name) in [(1, "輸液"), (2, "資機材"), (3, "その他")] {
        sqlx::query("INSERT INTO categories (id, name, icon) VALUES (?1, ?2, '')")
            .bind(id)
            .bind(name)
            .execute(db.pool())
            .await
            .unwrap();
    }
    db
}

/// Inserts an item with a fixed id.
pub async fn item(db: &Database, id: Id, name: &str, category_id: Option<Id>) {
    sqlx::query("INSERT INTO items (id, category_id, name, unit, has_expiry) VALUES (?1, ?2, ?3, '本', 1)")
        .bind(id)
        .bind(category_id)
        .bind(name)
        .execute(db.pool())
        .await
        .unwrap();
}

pub async fn stock(db: &Database, department_id: Id, item_id: Id, expiry: Option<&str>, qty: i64) -> StockRecord {
    let expiry = expiry.map(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap());
    db.stocks().insert(department_id, item_id, expiry, qty).await.unwrap()
}

pub async fn stock_in(db: &Database, department_id: Id, item_id: Id, qty: i64) {
    db.ledger()
        .record_movement(&NewMovement::stock_in(department_id, item_id, qty))
        .await
        .unwrap();
}

/// Everything a run could touch, for before/after comparisons.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub links: Vec<ItemCategoryLink>,
    pub stocks: Vec<StockRecord>,
    pub transactions: Vec<(Id, Id, i64)>,
}

pub async fn snapshot(db: &Database) -> Snapshot {
    let transactions = db
        .ledger()
        .list(&TransactionFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.id, t.item_id, t.quantity))
        .collect();

    Snapshot {
        items: db.catalog().list_items().await.unwrap(),
        links: db.catalog().list_links().await.unwrap(),
        stocks: db.stocks().list_all().await.unwrap(),
        transactions,
    }
}

/// Rows of stocks/transactions/links whose item no longer exists.
pub async fn orphan_count(db: &Database) -> i64 {
    sqlx::query_scalar(
        r#"
        SELECT
          (SELECT COUNT(*) FROM stocks WHERE item_id NOT IN (SELECT id FROM items))
        + (SELECT COUNT(*) FROM transactions WHERE item_id NOT IN (SELECT id FROM items))
        + (SELECT COUNT(*) FROM item_categories WHERE item_id NOT IN (SELECT id FROM items))
        "#,
    )
    .fetch_one(db.pool())
    .await
    .unwrap()
}

/// Wraps a [`Database`] and makes selected operations hang or race.
pub struct FaultyStore {
    inner: Database,
    hang: Mutex<HashMap<&'static str, usize>>,
    stock_in_on_count: Mutex<Option<(Id, Id)>>,
}

impl FaultyStore {
    pub fn new(inner: Database) -> Self {
        FaultyStore {
            inner,
            hang: Mutex::new(HashMap::new()),
            stock_in_on_count: Mutex::new(None),
        }
    }

    /// The next `times` calls of `op` never complete.
    pub fn hang(&self, op: &'static str, times: usize) {
        self.hang.lock().unwrap().insert(op, times);
    }

    /// Records a stock-in for `(department, item)` when transactions of that
    /// item are counted, like a live client writing mid-merge.
    pub fn stock_in_during_count(&self, department_id: Id, item_id: Id) {
        *self.stock_in_on_count.lock().unwrap() = Some((department_id, item_id));
    }

    async fn gate(&self, op: &'static str) {
        let hang = {
            let mut hang = self.hang.lock().unwrap();
            match hang.get_mut(op) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    true
                }
                _ => false,
            }
        };
        if hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl EntityStore for FaultyStore {
    async fn link_table_exists(&self) -> DbResult<bool> {
        self.gate("link_table_exists").await;
        self.inner.link_table_exists().await
    }

    async fn list_departments(&self) -> DbResult<Vec<Department>> {
        self.gate("list_departments").await;
        EntityStore::list_departments(&self.inner).await
    }

    async fn list_items(&self) -> DbResult<Vec<Item>> {
        self.gate("list_items").await;
        EntityStore::list_items(&self.inner).await
    }

    async fn list_links(&self, item_id: Id) -> DbResult<Vec<ItemCategoryLink>> {
        self.gate("list_links").await;
        EntityStore::list_links(&self.inner, item_id).await
    }

    async fn create_link(&self, item_id: Id, category_id: Id) -> DbResult<()> {
        self.gate("create_link").await;
        self.inner.create_link(item_id, category_id).await
    }

    async fn list_stock(&self, item_id: Id) -> DbResult<Vec<StockRecord>> {
        self.gate("list_stock").await;
        self.inner.list_stock(item_id).await
    }

    async fn combine_stock(&self, from: Id, into: Id) -> DbResult<i64> {
        self.gate("combine_stock").await;
        self.inner.combine_stock(from, into).await
    }

    async fn reassign_stock(&self, stock_id: Id, item_id: Id) -> DbResult<()> {
        self.gate("reassign_stock").await;
        self.inner.reassign_stock(stock_id, item_id).await
    }

    async fn reattribute_transactions(&self, from_item: Id, to_item: Id) -> DbResult<u64> {
        self.gate("reattribute_transactions").await;
        self.inner.reattribute_transactions(from_item, to_item).await
    }

    async fn count_transactions(&self, item_id: Id) -> DbResult<i64> {
        self.gate("count_transactions").await;
        let inject = self.stock_in_on_count.lock().unwrap().take();
        if let Some((department_id, target)) = inject {
            if target == item_id {
                self.inner
                    .ledger()
                    .record_movement(&NewMovement::stock_in(department_id, item_id, 1))
                    .await?;
            }
        }
        self.inner.count_transactions(item_id).await
    }

    async fn delete_item(&self, item_id: Id) -> DbResult<()> {
        self.gate("delete_item").await;
        EntityStore::delete_item(&self.inner, item_id).await
    }
}
