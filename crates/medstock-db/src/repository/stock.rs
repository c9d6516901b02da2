//! # Stock Repository
//!
//! Stock buckets: one row per (department, item, expiry).
//!
//! ## Merge Primitives
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  combine(from, into)          ONE TRANSACTION                           │
//! │  ├── SELECT quantity FROM stocks WHERE id = from                        │
//! │  ├── UPDATE stocks SET quantity = quantity + ? WHERE id = into          │
//! │  └── DELETE FROM stocks WHERE id = from                                 │
//! │                                                                         │
//! │  reassign(stock, item)                                                  │
//! │  └── UPDATE stocks SET item_id = ? WHERE id = stock                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The increment is applied in SQL (`quantity = quantity + ?`), never as a
//! read-modify-write of the target row, so concurrent stock movements on the
//! target are not lost.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use medstock_core::{Id, StockRecord, ValidationError};

/// Repository for stock rows.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Inserts a stock row directly (opening balances, seeding).
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the bucket already exists.
    pub async fn insert(
        &self,
        department_id: Id,
        item_id: Id,
        expiry_date: Option<NaiveDate>,
        quantity: i64,
    ) -> DbResult<StockRecord> {
        if quantity < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "quantity".to_string(),
            }
            .into());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO stocks (department_id, item_id, expiry_date, quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(department_id)
        .bind(item_id)
        .bind(expiry_date)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(StockRecord {
            id: result.last_insert_rowid(),
            department_id,
            item_id,
            expiry_date,
            quantity,
        })
    }

    /// Stock rows of one item.
    pub async fn list_for_item(&self, item_id: Id) -> DbResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT id, department_id, item_id, expiry_date, quantity
            FROM stocks
            WHERE item_id = ?1
            ORDER BY department_id, expiry_date, id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Stock rows held by one department.
    pub async fn list_for_department(&self, department_id: Id) -> DbResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT id, department_id, item_id, expiry_date, quantity
            FROM stocks
            WHERE department_id = ?1
            ORDER BY item_id, expiry_date, id
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Every stock row.
    pub async fn list_all(&self) -> DbResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT id, department_id, item_id, expiry_date, quantity
            FROM stocks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Looks up one bucket. `expiry_date = None` matches the no-expiry bucket.
    pub async fn find_bucket(
        &self,
        department_id: Id,
        item_id: Id,
        expiry_date: Option<NaiveDate>,
    ) -> DbResult<Option<StockRecord>> {
        let row = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT id, department_id, item_id, expiry_date, quantity
            FROM stocks
            WHERE department_id = ?1 AND item_id = ?2 AND expiry_date IS ?3
            "#,
        )
        .bind(department_id)
        .bind(item_id)
        .bind(expiry_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Adds the quantity of row `from` to row `into` and deletes `from`,
    /// atomically. Returns the quantity moved.
    ///
    /// ## Errors
    /// `DbError::NotFound` if either row is gone; nothing is changed then.
    pub async fn combine(&self, from: Id, into: Id) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM stocks WHERE id = ?1")
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?;
        let quantity = quantity.ok_or_else(|| DbError::not_found("Stock", from))?;

        let updated = sqlx::query("UPDATE stocks SET quantity = quantity + ?2 WHERE id = ?1")
            .bind(into)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("Stock", into));
        }

        sqlx::query("DELETE FROM stocks WHERE id = ?1")
            .bind(from)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(from, into, quantity, "Combined stock rows");
        Ok(quantity)
    }

    /// Re-points a stock row at another item.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the row is gone
    /// - `DbError::UniqueViolation` if the target item already has the bucket
    pub async fn reassign(&self, stock_id: Id, item_id: Id) -> DbResult<()> {
        let result = sqlx::query("UPDATE stocks SET item_id = ?2 WHERE id = ?1")
            .bind(stock_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock", stock_id));
        }

        debug!(stock_id, item_id, "Reassigned stock row");
        Ok(())
    }

    /// Number of stock rows referencing an item.
    pub async fn count_for_item(&self, item_id: Id) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks WHERE item_id = ?1")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::pool::{Database, DbConfig};
    use medstock_core::{Department, NewItem};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
            .insert_department(&Department {
                id: 1,
                name: "警防課".to_string(),
            })
            .await
            .unwrap();
        let a = db.catalog().create_item(&NewItem::simple("針18G", None)).await.unwrap();
        let b = db.catalog().create_item(&NewItem::simple("針１８Ｇ", None)).await.unwrap();
        (db, a.id, b.id)
    }

    #[tokio::test]
    async fn test_bucket_uniqueness_includes_no_expiry() {
        let (db, a, _) = setup().await;
        db.stocks().insert(1, a, None, 3).await.unwrap();

        let err = db.stocks().insert(1, a, None, 1).await.unwrap_err();
        assert!(err.is_unique_violation());

        let date = NaiveDate::from_ymd_opt(2026, 1, 1);
        db.stocks().insert(1, a, date, 1).await.unwrap();
        assert_eq!(db.stocks().list_for_item(a).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_bucket_null_expiry() {
        let (db, a, _) = setup().await;
        let row = db.stocks().insert(1, a, None, 3).await.unwrap();

        assert_eq!(db.stocks().find_bucket(1, a, None).await.unwrap(), Some(row));
        let date = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(db.stocks().find_bucket(1, a, date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_combine_sums_and_deletes() {
        let (db, a, b) = setup().await;
        let master = db.stocks().insert(1, a, None, 3).await.unwrap();
        let slave = db.stocks().insert(1, b, None, 4).await.unwrap();

        let moved = db.stocks().combine(slave.id, master.id).await.unwrap();

        assert_eq!(moved, 4);
        assert_eq!(db.stocks().find_bucket(1, a, None).await.unwrap().unwrap().quantity, 7);
        assert_eq!(db.stocks().count_for_item(b).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_combine_missing_target_changes_nothing() {
        let (db, _, b) = setup().await;
        let slave = db.stocks().insert(1, b, None, 4).await.unwrap();

        let err = db.stocks().combine(slave.id, 9999).await.unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
        assert_eq!(db.stocks().find_bucket(1, b, None).await.unwrap().unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_reassign_conflicting_bucket_rejected() {
        let (db, a, b) = setup().await;
        db.stocks().insert(1, a, None, 3).await.unwrap();
        let slave = db.stocks().insert(1, b, None, 4).await.unwrap();

        let err = db.stocks().reassign(slave.id, a).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_list_for_department_only_its_rows() {
        let (db, a, b) = setup().await;
        db.catalog()
            .insert_department(&Department {
                id: 2,
                name: "三次".to_string(),
            })
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1);
        db.stocks().insert(1, b, None, 4).await.unwrap();
        db.stocks().insert(1, a, date, 2).await.unwrap();
        db.stocks().insert(2, a, None, 9).await.unwrap();

        let rows = db.stocks().list_for_department(1).await.unwrap();

        let items: Vec<i64> = rows.iter().map(|r| r.item_id).collect();
        assert_eq!(items, vec![a, b]);
        assert!(rows.iter().all(|r| r.department_id == 1));
        assert!(db.stocks().list_for_department(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_opening_balance_rejected() {
        let (db, a, _) = setup().await;
        assert!(db.stocks().insert(1, a, None, -1).await.is_err());
    }
}
