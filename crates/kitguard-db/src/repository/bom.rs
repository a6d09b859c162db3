//! # BOM Repository
//!
//! Single-level bills of materials. One active BOM per kit; rows keep the
//! order they were written in via `sequence`.

use sqlx::SqlitePool;
use tracing::debug;

use kitguard_core::validation::validate_components;
use kitguard_core::{Component, ProductId, Quantity};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ComponentRow {
    component_id: String,
    name: String,
    quantity_milli: i64,
}

impl From<ComponentRow> for Component {
    fn from(row: ComponentRow) -> Self {
        Component::new(row.component_id, row.name, Quantity::from_milli(row.quantity_milli))
    }
}

/// Repository for BOM database operations.
#[derive(Debug, Clone)]
pub struct BomRepository {
    pool: SqlitePool,
}

impl BomRepository {
    /// Creates a new BomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BomRepository { pool }
    }

    /// Direct components of a kit in BOM order, names joined from `products`.
    ///
    /// A product with no BOM rows yields an empty list.
    pub async fn get_components(&self, kit_id: &str) -> DbResult<Vec<Component>> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT b.component_id, p.name, b.quantity_milli
            FROM bom_lines b
            JOIN products p ON p.id = b.component_id
            WHERE b.kit_id = ?1
            ORDER BY b.sequence, b.id
            "#,
        )
        .bind(kit_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(kit_id = %kit_id, count = rows.len(), "BOM fetched");
        Ok(rows.into_iter().map(Component::from).collect())
    }

    /// Replaces the kit's BOM in one transaction.
    ///
    /// Component names in the input are ignored; they are always read back
    /// from `products`.
    ///
    /// ## Errors
    /// - `DbError::InvalidData` for empty ids, non-positive quantities or a
    ///   kit listing itself
    /// - `DbError::ForeignKeyViolation` when a component does not exist
    pub async fn replace_components(&self, kit_id: &str, components: &[Component]) -> DbResult<()> {
        validate_components(&ProductId::new(kit_id), components)
            .map_err(|e| DbError::InvalidData(e.to_string()))?;

        debug!(kit_id = %kit_id, count = components.len(), "Replacing BOM");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM bom_lines WHERE kit_id = ?1")
            .bind(kit_id)
            .execute(&mut *tx)
            .await?;

        for (sequence, component) in components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bom_lines (kit_id, component_id, quantity_milli, sequence)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(kit_id)
            .bind(component.product_id.as_str())
            .bind(component.unit_quantity.milli())
            .bind(sequence as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Removes the kit's BOM; the product stops being a kit.
    pub async fn clear(&self, kit_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM bom_lines WHERE kit_id = ?1")
            .bind(kit_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
