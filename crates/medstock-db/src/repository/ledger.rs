//! # Ledger Repository
//!
//! Stock movements and the append-only transaction log.
//!
//! ## Movement Flow
//! ```text
//! record_movement(NewMovement)          ONE TRANSACTION
//!   ├── validate (quantity > 0, remarks bounded)
//!   ├── load item (NotFound if absent); drop expiry unless has_expiry
//!   ├── IN : bucket += qty (insert bucket if absent)
//!   ├── OUT: bucket -= qty (InsufficientStock if bucket < qty)
//!   └── INSERT INTO transactions (..., timestamp = now UTC)
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use medstock_core::validation::validate_movement;
use medstock_core::{
    CoreError, Id, NewMovement, StockBucket, TransactionRecord, TransactionType,
};

/// Filter for [`LedgerRepository::list`]. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub department_id: Option<Id>,
    pub item_id: Option<Id>,
    pub limit: Option<i64>,
}

impl TransactionFilter {
    pub fn for_item(item_id: Id) -> Self {
        TransactionFilter {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    pub fn for_department(department_id: Id) -> Self {
        TransactionFilter {
            department_id: Some(department_id),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Repository for stock movements.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Applies a stock movement and appends it to the ledger.
    ///
    /// ## Errors
    /// - `DbError::Domain(CoreError::Validation)` for a non-positive quantity
    /// - `DbError::NotFound` if the item does not exist
    /// - `DbError::Domain(CoreError::InsufficientStock)` when an OUT exceeds
    ///   the bucket; nothing is written then
    pub async fn record_movement(&self, movement: &NewMovement) -> DbResult<TransactionRecord> {
        validate_movement(movement)?;

        let mut tx = self.pool.begin().await?;

        let has_expiry: Option<bool> =
            sqlx::query_scalar("SELECT has_expiry FROM items WHERE id = ?1")
                .bind(movement.item_id)
                .fetch_optional(&mut *tx)
                .await?;
        let has_expiry = has_expiry.ok_or_else(|| DbError::not_found("Item", movement.item_id))?;

        let expiry_date = if has_expiry {
            movement.expiry_date
        } else {
            None
        };
        let bucket = StockBucket::new(movement.department_id, expiry_date);

        let current: Option<(Id, i64)> = sqlx::query_as(
            r#"
            SELECT id, quantity FROM stocks
            WHERE department_id = ?1 AND item_id = ?2 AND expiry_date IS ?3
            "#,
        )
        .bind(movement.department_id)
        .bind(movement.item_id)
        .bind(expiry_date)
        .fetch_optional(&mut *tx)
        .await?;

        match (movement.kind, current) {
            (TransactionType::In, Some((stock_id, _))) => {
                sqlx::query("UPDATE stocks SET quantity = quantity + ?2 WHERE id = ?1")
                    .bind(stock_id)
                    .bind(movement.quantity)
                    .execute(&mut *tx)
                    .await?;
            }
            (TransactionType::In, None) => {
                sqlx::query(
                    r#"
                    INSERT INTO stocks (department_id, item_id, expiry_date, quantity)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .bind(movement.department_id)
                .bind(movement.item_id)
                .bind(expiry_date)
                .bind(movement.quantity)
                .execute(&mut *tx)
                .await?;
            }
            (TransactionType::Out, current) => {
                let (stock_id, available) = current.unwrap_or((0, 0));
                if available < movement.quantity {
                    return Err(CoreError::InsufficientStock {
                        item_id: movement.item_id,
                        bucket,
                        available,
                        requested: movement.quantity,
                    }
                    .into());
                }

                sqlx::query("UPDATE stocks SET quantity = quantity - ?2 WHERE id = ?1")
                    .bind(stock_id)
                    .bind(movement.quantity)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let timestamp = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO transactions
                (department_id, item_id, type, quantity, expiry_date, remarks, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(movement.department_id)
        .bind(movement.item_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(expiry_date)
        .bind(&movement.remarks)
        .bind(timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            item_id = movement.item_id,
            bucket = %bucket,
            kind = %movement.kind,
            quantity = movement.quantity,
            "Movement recorded"
        );

        Ok(TransactionRecord {
            id: result.last_insert_rowid(),
            department_id: movement.department_id,
            item_id: movement.item_id,
            kind: movement.kind,
            quantity: movement.quantity,
            expiry_date,
            remarks: movement.remarks.clone(),
            timestamp,
        })
    }

    /// Lists transactions newest first.
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, department_id, item_id, type, quantity, expiry_date, remarks, timestamp
            FROM transactions
            WHERE (?1 IS NULL OR department_id = ?1)
              AND (?2 IS NULL OR item_id = ?2)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?3
            "#,
        )
        .bind(filter.department_id)
        .bind(filter.item_id)
        .bind(filter.limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Re-points every transaction of `from_item` at `to_item`.
    ///
    /// Returns the number of rows changed; zero on a second call.
    pub async fn reattribute(&self, from_item: Id, to_item: Id) -> DbResult<u64> {
        let result = sqlx::query("UPDATE transactions SET item_id = ?2 WHERE item_id = ?1")
            .bind(from_item)
            .bind(to_item)
            .execute(&self.pool)
            .await?;

        debug!(
            from_item,
            to_item,
            rows = result.rows_affected(),
            "Transactions reattributed"
        );
        Ok(result.rows_affected())
    }

    /// Number of transactions referencing an item.
    pub async fn count_for_item(&self, item_id: Id) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE item_id = ?1")
                .bind(item_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
