//! # Stock Repository
//!
//! Available quantities per product and the payment-time consumption of
//! kit components.
//!
//! ## Consumption
//! ```text
//! consume_kits([GIFT-BOX ×2, PARTY ×1])
//!     │
//!     ├── BEGIN
//!     ├── needs: RIBBON 2+1=3, CARD 2           (summed across lines)
//!     ├── UPDATE ... WHERE available_milli >= need   per component
//!     │       0 rows affected → record Shortage
//!     ├── any shortage → ROLLBACK, nothing deducted
//!     └── else COMMIT
//! ```
//!
//! The kit's own stock row is never touched.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use kitguard_core::{KitConsumption, ProductId, Quantity, Shortage};

use crate::error::{DbError, DbResult};

/// Result of a consumption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Every component was deducted.
    Consumed,
    /// Nothing was deducted; these components were short.
    Short(Vec<Shortage>),
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct NeedRow {
    component_id: String,
    name: String,
    quantity_milli: i64,
}

/// Repository for stock level operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Current available quantity. A product without a stock row has zero.
    pub async fn get_available(&self, product_id: &str) -> DbResult<Quantity> {
        let milli: Option<i64> =
            sqlx::query_scalar("SELECT available_milli FROM stock_levels WHERE product_id = ?1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(Quantity::from_milli(milli.unwrap_or(0)))
    }

    /// Sets the available quantity (stock count, receiving).
    pub async fn set_available(&self, product_id: &str, available: Quantity) -> DbResult<()> {
        debug!(product_id = %product_id, %available, "Setting stock level");

        sqlx::query(
            r#"
            INSERT INTO stock_levels (product_id, available_milli, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id) DO UPDATE SET
                available_milli = excluded.available_milli,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(available.milli())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds `delta` (may be negative) and returns the new level.
    pub async fn adjust(&self, product_id: &str, delta: Quantity) -> DbResult<Quantity> {
        debug!(product_id = %product_id, %delta, "Adjusting stock level");

        let milli: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stock_levels (product_id, available_milli, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id) DO UPDATE SET
                available_milli = available_milli + excluded.available_milli,
                updated_at = excluded.updated_at
            RETURNING available_milli
            "#,
        )
        .bind(product_id)
        .bind(delta.milli())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(Quantity::from_milli(milli))
    }

    /// Deducts the components of every kit line, all or nothing.
    ///
    /// Lines for products without a BOM deduct nothing. Availability is
    /// re-checked by the conditional `UPDATE`, so a concurrent sale between
    /// the order check and this call still ends in `ConsumeOutcome::Short`.
    pub async fn consume_kits(&self, lines: &[KitConsumption]) -> DbResult<ConsumeOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let needs = collect_needs(&mut tx, lines).await?;
        let mut shortages = Vec::new();
        let now = Utc::now();

        for (component_id, name, required) in &needs {
            let result = sqlx::query(
                r#"
                UPDATE stock_levels
                SET available_milli = available_milli - ?2, updated_at = ?3
                WHERE product_id = ?1 AND available_milli >= ?2
                "#,
            )
            .bind(component_id.as_str())
            .bind(required.milli())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT available_milli FROM stock_levels WHERE product_id = ?1",
                )
                .bind(component_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;

                shortages.push(Shortage {
                    component_id: component_id.clone(),
                    component_name: name.clone(),
                    required: *required,
                    available: Quantity::from_milli(available.unwrap_or(0)),
                });
            }
        }

        if !shortages.is_empty() {
            warn!(short = shortages.len(), "Component consumption refused");
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            return Ok(ConsumeOutcome::Short(shortages));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(kits = lines.len(), components = needs.len(), "Kit components consumed");
        Ok(ConsumeOutcome::Consumed)
    }
}

/// Total requirement per component across all lines, first-seen order.
async fn collect_needs(
    tx: &mut Transaction<'_, Sqlite>,
    lines: &[KitConsumption],
) -> DbResult<Vec<(ProductId, String, Quantity)>> {
    let mut needs: Vec<(ProductId, String, Quantity)> = Vec::new();

    for line in lines {
        let rows = sqlx::query_as::<_, NeedRow>(
            r#"
            SELECT b.component_id, p.name, b.quantity_milli
            FROM bom_lines b
            JOIN products p ON p.id = b.component_id
            WHERE b.kit_id = ?1
            ORDER BY b.sequence, b.id
            "#,
        )
        .bind(line.kit_id.as_str())
        .fetch_all(&mut **tx)
        .await?;

        for row in rows {
            let required = Quantity::from_milli(row.quantity_milli).times(line.quantity);
            match needs.iter_mut().find(|(id, _, _)| id.as_str() == row.component_id) {
                Some((_, _, total)) => *total += required,
                None => needs.push((ProductId::new(row.component_id), row.name, required)),
            }
        }
    }

    Ok(needs)
}
