//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Key Operations
//! - Kit flag lookup (`get_meta`)
//! - Session catalog load (`list_catalog`)
//! - Insert / toggle the store-level kit switch
//!
//! ## Derived `has_bom`
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                           bom_lines                           │
//! │  ┌──────────┬─────────────┐         ┌──────────┬──────────────┐         │
//! │  │ id       │ kit_enabled │         │ kit_id   │ component_id │         │
//! │  ├──────────┼─────────────┤         ├──────────┼──────────────┤         │
//! │  │ GIFT-BOX │ 1           │◄────────│ GIFT-BOX │ RIBBON       │         │
//! │  │ RIBBON   │ 0           │         │ GIFT-BOX │ CARD         │         │
//! │  └──────────┴─────────────┘         └──────────┴──────────────┘         │
//! │                                                                         │
//! │  has_bom = EXISTS (SELECT 1 FROM bom_lines WHERE kit_id = products.id)  │
//! │  never stored, so it cannot drift from the BOM itself                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use kitguard_core::validation::{validate_product_id, validate_product_name};
use kitguard_core::{CatalogProduct, KitFlags};

use crate::error::{DbError, DbResult};

/// One row of `products` plus the derived `has_bom` column.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub kit_enabled: i64,
    pub has_bom: i64,
    pub is_active: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub fn flags(&self) -> KitFlags {
        KitFlags::new(self.kit_enabled != 0, self.has_bom != 0)
    }
}

impl From<ProductRow> for CatalogProduct {
    fn from(row: ProductRow) -> Self {
        let flags = row.flags();
        CatalogProduct::new(row.id, row.name, flags)
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.kit_enabled,
        EXISTS (SELECT 1 FROM bom_lines b WHERE b.kit_id = p.id) AS has_bom,
        p.is_active,
        p.created_at,
        p.updated_at
    FROM products p
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// repo.insert("GIFT-BOX", "Gift Box", true).await?;
/// let flags = repo.get_meta("GIFT-BOX").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new active product.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the id already exists.
    pub async fn insert(&self, id: &str, name: &str, kit_enabled: bool) -> DbResult<()> {
        debug!(id = %id, kit_enabled, "Inserting product");
        validate_product_id(id)
            .and_then(|()| validate_product_name(name))
            .map_err(|e| DbError::InvalidData(e.to_string()))?;

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (id, name, kit_enabled, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(kit_enabled)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by id (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductRow>> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id = ?1");

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Kit flags of an active product.
    ///
    /// ## Errors
    /// `DbError::NotFound` for unknown or inactive products.
    pub async fn get_meta(&self, id: &str) -> DbResult<KitFlags> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id = ?1 AND p.is_active = 1");

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        Ok(row.flags())
    }

    /// Every active product, ordered by name, for the session preload.
    pub async fn list_catalog(&self) -> DbResult<Vec<ProductRow>> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.is_active = 1 ORDER BY p.name, p.id");

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Catalog loaded");
        Ok(rows)
    }

    /// Turns kit behavior on or off for one product.
    pub async fn set_kit_enabled(&self, id: &str, enabled: bool) -> DbResult<()> {
        debug!(id = %id, enabled, "Updating kit switch");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET kit_enabled = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product; it disappears from the catalog and lookups.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
