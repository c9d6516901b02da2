//! # Catalog Repository
//!
//! Departments, categories, items and item ↔ category links.
//!
//! ## Category Membership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items.category_id  (legacy, single)                                   │
//! │        │                                                                │
//! │        │  backfilled by the consolidation engine                        │
//! │        ▼                                                                │
//! │  item_categories (item_id, category_id)  UNIQUE                         │
//! │        │                                                                │
//! │        └── link_item() on an existing pair → DbError::UniqueViolation   │
//! │            (callers treat that as "already linked")                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use medstock_core::validation::{validate_name, validate_new_item};
use medstock_core::{Category, Department, Id, Item, ItemCategoryLink, NewItem};

/// Repository for catalog records.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Departments
    // =========================================================================

    /// Registers a department with a fixed id (reference data).
    pub async fn insert_department(&self, department: &Department) -> DbResult<()> {
        validate_name("department", &department.name)?;

        sqlx::query("INSERT INTO departments (id, name) VALUES (?1, ?2)")
            .bind(department.id)
            .bind(&department.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists all departments ordered by id.
    pub async fn list_departments(&self) -> DbResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, name FROM departments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Creates a category.
    pub async fn create_category(&self, name: &str, icon: &str) -> DbResult<Category> {
        validate_name("category", name)?;

        let result = sqlx::query("INSERT INTO categories (name, icon) VALUES (?1, ?2)")
            .bind(name)
            .bind(icon)
            .execute(&self.pool)
            .await?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            icon: icon.to_string(),
        })
    }

    /// Lists all categories ordered by id.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, icon FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Creates an item.
    ///
    /// Only the legacy `category_id` column is written; links are created
    /// separately (or by the consolidation backfill).
    pub async fn create_item(&self, item: &NewItem) -> DbResult<Item> {
        validate_new_item(item)?;

        debug!(name = %item.name, "Inserting item");

        let result = sqlx::query(
            r#"
            INSERT INTO items (category_id, name, unit, has_expiry, min_stock)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(item.category_id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.has_expiry)
        .bind(item.min_stock)
        .execute(&self.pool)
        .await?;

        Ok(Item {
            id: result.last_insert_rowid(),
            name: item.name.clone(),
            unit: item.unit.clone(),
            has_expiry: item.has_expiry,
            min_stock: item.min_stock,
            category_id: item.category_id,
        })
    }

    /// Gets an item by id.
    pub async fn get_item(&self, id: Id) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, unit, has_expiry, min_stock, category_id
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists all items in id order.
    pub async fn list_items(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, unit, has_expiry, min_stock, category_id
            FROM items
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items linked to a category (explicit links or legacy reference).
    pub async fn list_items_in_category(&self, category_id: Id) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, unit, has_expiry, min_stock, category_id
            FROM items
            WHERE category_id = ?1
               OR id IN (SELECT item_id FROM item_categories WHERE category_id = ?1)
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Deletes an item and its category links in one transaction.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the item does not exist
    /// - `DbError::ForeignKeyViolation` if stock or transactions still
    ///   reference the item
    pub async fn delete_item(&self, id: Id) -> DbResult<()> {
        debug!(id, "Deleting item");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM item_categories WHERE item_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Counts items (for diagnostics).
    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Links an item to a category.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the pair is already linked.
    pub async fn link_item(&self, item_id: Id, category_id: Id) -> DbResult<ItemCategoryLink> {
        sqlx::query("INSERT INTO item_categories (item_id, category_id) VALUES (?1, ?2)")
            .bind(item_id)
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => {
                    DbError::duplicate(field, format!("{item_id}/{category_id}"))
                }
                other => other,
            })?;

        Ok(ItemCategoryLink {
            item_id,
            category_id,
        })
    }

    /// Links of one item, ordered by category.
    pub async fn links_for_item(&self, item_id: Id) -> DbResult<Vec<ItemCategoryLink>> {
        let links = sqlx::query_as::<_, ItemCategoryLink>(
            r#"
            SELECT item_id, category_id
            FROM item_categories
            WHERE item_id = ?1
            ORDER BY category_id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    /// All links, ordered by item then category.
    pub async fn list_links(&self) -> DbResult<Vec<ItemCategoryLink>> {
        let links = sqlx::query_as::<_, ItemCategoryLink>(
            "SELECT item_id, category_id FROM item_categories ORDER BY item_id, category_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use medstock_core::{Department, NewItem};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_items() {
        let db = db().await;
        let cat = db.catalog().create_category("静脈路確保", "vaccines").await.unwrap();
        let item = db
            .catalog()
            .create_item(&NewItem::simple("針18G", Some(cat.id)))
            .await
            .unwrap();

        let items = db.catalog().list_items().await.unwrap();
        assert_eq!(items, vec![item.clone()]);
        assert_eq!(db.catalog().get_item(item.id).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn test_list_categories_in_id_order() {
        let db = db().await;
        let first = db.catalog().create_category("静脈路確保", "vaccines").await.unwrap();
        let second = db.catalog().create_category("外傷", "healing").await.unwrap();

        assert_eq!(db.catalog().list_categories().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_duplicate_link_is_unique_violation() {
        let db = db().await;
        let cat = db.catalog().create_category("外傷", "healing").await.unwrap();
        let item = db
            .catalog()
            .create_item(&NewItem::simple("三角巾", Some(cat.id)))
            .await
            .unwrap();

        db.catalog().link_item(item.id, cat.id).await.unwrap();
        let err = db.catalog().link_item(item.id, cat.id).await.unwrap_err();
        assert!(err.is_unique_violation());

        assert_eq!(db.catalog().links_for_item(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_item_removes_links() {
        let db = db().await;
        let cat = db.catalog().create_category("消毒", "sanitizer").await.unwrap();
        let item = db
            .catalog()
            .create_item(&NewItem::simple("酒精綿", None))
            .await
            .unwrap();
        db.catalog().link_item(item.id, cat.id).await.unwrap();

        db.catalog().delete_item(item.id).await.unwrap();

        assert!(db.catalog().get_item(item.id).await.unwrap().is_none());
        assert!(db.catalog().list_links().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_item_with_stock_is_rejected() {
        let db = db().await;
        db.catalog()
            .insert_department(&Department {
                id: 1,
                name: "警防課".to_string(),
            })
            .await
            .unwrap();
        let item = db
            .catalog()
            .create_item(&NewItem::simple("ゴーグル", None))
            .await
            .unwrap();
        db.stocks().insert(1, item.id, None, 2).await.unwrap();

        let err = db.catalog().delete_item(item.id).await.unwrap_err();
        assert!(matches!(err, crate::DbError::ForeignKeyViolation { .. }));
        assert!(db.catalog().get_item(item.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_items_in_category_includes_links_and_legacy() {
        let db = db().await;
        let a = db.catalog().create_category("感染防止", "clean_hands").await.unwrap();
        let b = db.catalog().create_category("感染防止衣", "checkroom").await.unwrap();
        let legacy = db
            .catalog()
            .create_item(&NewItem::simple("N95マスク（枚）", Some(a.id)))
            .await
            .unwrap();
        let linked = db
            .catalog()
            .create_item(&NewItem::simple("ゴーグル", Some(b.id)))
            .await
            .unwrap();
        db.catalog().link_item(linked.id, a.id).await.unwrap();

        let ids: Vec<i64> = db
            .catalog()
            .list_items_in_category(a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![legacy.id, linked.id]);
    }
}
