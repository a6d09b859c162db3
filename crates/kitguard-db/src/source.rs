//! # SQLite Port Adapters
//!
//! Implements the kitguard-core port traits on top of the repositories so a
//! POS session or the stock-api can validate against the local database.
//!
//! ```text
//! CatalogSource    ──► ProductRepository + BomRepository
//! StockSource      ──► StockRepository::get_available
//! InventoryLedger  ──► StockRepository::consume_kits (one transaction)
//! ```

use async_trait::async_trait;

use kitguard_core::{
    CatalogProduct, CatalogSource, Component, InventoryLedger, KitConsumption, KitFlags,
    LedgerError, ProductId, Quantity, SourceResult, StockSource,
};

use crate::pool::Database;
use crate::repository::stock::ConsumeOutcome;

/// Port adapter over a [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteSources {
    db: Database,
}

impl SqliteSources {
    pub fn new(db: Database) -> Self {
        SqliteSources { db }
    }
}

#[async_trait]
impl CatalogSource for SqliteSources {
    async fn get_product_meta(&self, product_id: &ProductId) -> SourceResult<KitFlags> {
        Ok(self.db.products().get_meta(product_id.as_str()).await?)
    }

    async fn get_components(&self, kit_id: &ProductId) -> SourceResult<Vec<Component>> {
        Ok(self.db.boms().get_components(kit_id.as_str()).await?)
    }

    async fn load_catalog(&self) -> SourceResult<Vec<CatalogProduct>> {
        let rows = self.db.products().list_catalog().await?;
        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }
}

#[async_trait]
impl StockSource for SqliteSources {
    async fn get_available_quantity(&self, product_id: &ProductId) -> SourceResult<Quantity> {
        Ok(self.db.stock().get_available(product_id.as_str()).await?)
    }
}

#[async_trait]
impl InventoryLedger for SqliteSources {
    async fn consume_kits(&self, lines: &[KitConsumption]) -> Result<(), LedgerError> {
        match self
            .db
            .stock()
            .consume_kits(lines)
            .await
            .map_err(kitguard_core::SourceError::from)?
        {
            ConsumeOutcome::Consumed => Ok(()),
            ConsumeOutcome::Short(shortages) => Err(LedgerError::Insufficient(shortages)),
        }
    }
}
