//! # Ports
//!
//! The traits through which kitguard-core reads the outside world.
//!
//! ## Adapters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Port                   Suspends on              Adapters               │
//! │  ─────────────────────  ───────────────────────  ─────────────────────  │
//! │  CatalogSource          flags / BOM fetch        SqliteSources (db)     │
//! │                                                  InMemoryStore (memory) │
//! │  StockSource            per-component read       SqliteSources (db)     │
//! │                                                  InMemoryStore (memory) │
//! │  RemoteStockValidator   one HTTP round trip      HttpStockValidator     │
//! │  InventoryLedger        payment commit           SqliteSources (db)     │
//! │                                                  InMemoryStore (memory) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All methods are read-only and idempotent except
//! [`InventoryLedger::consume_kits`].

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{SourceError, SourceResult};
use crate::quantity::Quantity;
use crate::types::{CatalogProduct, Component, KitFlags, ProductId};
use crate::verdict::{Shortage, ValidationResult};

/// Product metadata and bill-of-materials lookups.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Kit flags of one product.
    async fn get_product_meta(&self, product_id: &ProductId) -> SourceResult<KitFlags>;

    /// Direct components of a kit, in BOM order.
    async fn get_components(&self, kit_id: &ProductId) -> SourceResult<Vec<Component>>;

    /// Every sellable product, used once at session load.
    async fn load_catalog(&self) -> SourceResult<Vec<CatalogProduct>>;
}

/// Current available quantity per product.
///
/// Other processes change stock at any time; callers read at evaluation
/// time and never keep the value.
#[async_trait]
pub trait StockSource: Send + Sync {
    async fn get_available_quantity(&self, product_id: &ProductId) -> SourceResult<Quantity>;
}

/// Server-side line check with the same contract as the local one.
#[async_trait]
pub trait RemoteStockValidator: Send + Sync {
    async fn validate_stock(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        context_id: &str,
    ) -> SourceResult<ValidationResult>;
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// One kit line to be consumed at payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitConsumption {
    pub kit_id: ProductId,
    pub quantity: Quantity,
}

/// Why a payment's component consumption was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A component became short after the order was cleared for payment.
    #[error("insufficient stock for {} component(s)", .0.len())]
    Insufficient(Vec<Shortage>),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Deducts kit components when an order is paid.
///
/// ## Contract
/// - Only components are deducted, never the kit's own stock
/// - All lines succeed or nothing is deducted
/// - Availability is re-checked inside the same unit of work
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    async fn consume_kits(&self, lines: &[KitConsumption]) -> Result<(), LedgerError>;
}
