//! # POS Session
//!
//! One register's view of kit validation: the catalog cache, the current
//! order and the two gates in front of it.
//!
//! ## Gates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Workflow                                 │
//! │                                                                         │
//! │  preload() ──► CatalogCache (flags + kit BOMs, once per session)        │
//! │                                                                         │
//! │  add_to_cart(KIT, 2)                                                    │
//! │     ├── target = existing line qty + 2                                  │
//! │     ├── LineValidator (purpose AddToCart) ── rejected ──► PosError      │
//! │     └── order unchanged since check? ── no ──► STALE_RESULT             │
//! │                                         yes ──► merge / new line        │
//! │                                                                         │
//! │  begin_payment()                                                        │
//! │     ├── OrderValidator on a snapshot ── errors ──► INSUFFICIENT_STOCK   │
//! │     └── PaymentClearance { order_id, revision }                         │
//! │                                                                         │
//! │  complete_payment(clearance)                                            │
//! │     ├── order id / revision moved? ──► STALE_RESULT                     │
//! │     ├── freeze order (cart edits ──► STALE_RESULT until done)           │
//! │     ├── InventoryLedger::consume_kits(all kit lines)  (all or nothing)  │
//! │     └── new order                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use kitguard_core::validation::{validate_cart_size, validate_quantity};
use kitguard_core::{
    CatalogCache, CatalogProduct, CatalogReport, CatalogSource, InventoryLedger, KitConsumption,
    KitInfo, LineId, LineValidator, Order, OrderId, OrderValidator, ProductId, Quantity,
    RemoteStockValidator, StockSource, ValidationContext, ValidationMode, ValidationResult,
};
use kitguard_db::Database;

use crate::cart::CartState;
use crate::config::ValidatorConfig;
use crate::error::{ConfigError, PosError, PosResult};
use crate::remote::HttpStockValidator;

/// Proof that an order passed the payment gate.
///
/// Only valid for the exact order revision it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentClearance {
    pub order_id: OrderId,
    pub revision: u64,
    #[ts(as = "String")]
    pub cleared_at: DateTime<Utc>,
}

/// The data sources a session validates against.
#[derive(Clone)]
pub struct SessionSources {
    pub catalog: Arc<dyn CatalogSource>,
    pub stock: Arc<dyn StockSource>,
    pub ledger: Arc<dyn InventoryLedger>,
    pub remote: Option<Arc<dyn RemoteStockValidator>>,
}

impl SessionSources {
    /// Catalog, stock and ledger from one object.
    pub fn from_store<S>(store: S) -> Self
    where
        S: CatalogSource + StockSource + InventoryLedger + 'static,
    {
        let store = Arc::new(store);
        SessionSources {
            catalog: store.clone(),
            stock: store.clone(),
            ledger: store,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStockValidator>) -> Self {
        self.remote = Some(remote);
        self
    }
}

/// A register session.
pub struct PosSession {
    config: ValidatorConfig,
    cache: Arc<CatalogCache>,
    catalog: Arc<dyn CatalogSource>,
    ledger: Arc<dyn InventoryLedger>,
    lines: LineValidator,
    orders: OrderValidator,
    cart: CartState,
}

impl PosSession {
    /// Creates a session. In remote mode without an explicit remote client,
    /// an [`HttpStockValidator`] is built from `config.remote`.
    pub fn new(config: ValidatorConfig, sources: SessionSources) -> PosResult<Self> {
        config.validate()?;

        let remote = match (sources.remote, config.validation.mode) {
            (Some(remote), _) => Some(remote),
            (None, ValidationMode::Remote) => {
                let url = config
                    .remote_url()
                    .ok_or_else(|| ConfigError::Invalid("remote mode requires remote.url".into()))?;
                let client =
                    HttpStockValidator::new(url, Duration::from_secs(config.remote.timeout_secs))?;
                Some(Arc::new(client) as Arc<dyn RemoteStockValidator>)
            }
            (None, ValidationMode::Local) => None,
        };

        let cache = Arc::new(CatalogCache::new());
        let mut lines = LineValidator::new(
            cache.clone(),
            sources.catalog.clone(),
            sources.stock,
            config.policy(),
        );
        if let Some(remote) = remote {
            lines = lines.with_remote(remote);
        }
        let orders = OrderValidator::new(lines.clone(), config.context_id());

        info!(
            context_id = %config.context_id(),
            mode = %config.validation.mode,
            enabled = config.validation.enabled,
            "POS session created"
        );

        Ok(PosSession {
            config,
            cache,
            catalog: sources.catalog,
            ledger: sources.ledger,
            lines,
            orders,
            cart: CartState::new(),
        })
    }

    /// Session over the local SQLite database.
    pub fn open(config: ValidatorConfig, db: &Database) -> PosResult<Self> {
        Self::new(config, SessionSources::from_store(db.sources()))
    }

    /// Session load: fills the catalog cache.
    pub async fn preload(&self) -> PosResult<CatalogReport> {
        let report = self.cache.preload(self.catalog.as_ref()).await.map_err(|e| {
            warn!(error = %e, "Catalog preload failed");
            PosError::unavailable()
        })?;
        info!(
            total = report.total,
            kits = report.kit_products,
            "Catalog preloaded"
        );
        Ok(report)
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds `quantity` of a product, merging into its line if present.
    ///
    /// The line is checked at the quantity it would hold after the add.
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: Quantity) -> PosResult<LineId> {
        validate_quantity(quantity)?;

        let (order_id, target, new_line, lines) = self.cart.with_order(|order| {
            (
                order.id.clone(),
                order.quantity_after_add(product_id, quantity),
                order.line_for_product(product_id).is_none(),
                order.len(),
            )
        });
        if new_line {
            validate_cart_size(lines)?;
        }

        let ctx = ValidationContext::add_to_cart(self.config.context_id());
        let result = self.lines.validate_line(product_id, target, &ctx).await;
        if !result.valid {
            return Err(PosError::from_rejection(&result));
        }

        let name = self.cache.display_name(product_id);
        self.cart.with_order_mut(|order| {
            if order.id != order_id || order.quantity_after_add(product_id, quantity) != target {
                debug!(product_id = %product_id, "Dropping stale add-to-cart check");
                return Err(PosError::stale("the item"));
            }
            Ok(order.add(product_id, &name, quantity)?)
        })?
    }

    /// Sets a line's quantity. Zero removes the line without a check.
    pub async fn update_quantity(&self, line_id: &LineId, quantity: Quantity) -> PosResult<()> {
        if quantity.is_zero() {
            return self.remove_line(line_id);
        }

        let (order_id, product_id) = self.cart.with_order(|order| {
            order
                .line(line_id)
                .map(|line| (order.id.clone(), line.product_id.clone()))
                .ok_or_else(|| PosError::not_found("Order line", line_id.as_str()))
        })?;

        let ctx = ValidationContext::add_to_cart(self.config.context_id());
        let result = self.lines.validate_line(&product_id, quantity, &ctx).await;
        if !result.valid {
            return Err(PosError::from_rejection(&result));
        }

        self.cart.with_order_mut(|order| {
            let same_line = order.line(line_id).map(|line| &line.product_id) == Some(&product_id);
            if order.id != order_id || !same_line {
                debug!(line_id = %line_id, "Dropping stale quantity check");
                return Err(PosError::stale("the quantity"));
            }
            Ok(order.set_quantity(line_id, quantity)?)
        })?
    }

    pub fn remove_line(&self, line_id: &LineId) -> PosResult<()> {
        Ok(self.cart.with_order_mut(|order| order.remove_line(line_id))??)
    }

    /// Drops the order and starts a new one.
    pub fn clear(&self) -> PosResult<()> {
        let dropped = self.cart.reset()?;
        debug!(order_id = %dropped.id, lines = dropped.len(), "Order cleared");
        Ok(())
    }

    /// Snapshot of the current order.
    pub fn order(&self) -> Order {
        self.cart.snapshot()
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Runs the order check right before payment.
    pub async fn begin_payment(&self) -> PosResult<PaymentClearance> {
        let snapshot = self.cart.snapshot();
        if snapshot.is_empty() {
            return Err(PosError::cart("Order is empty"));
        }

        let verdict = self.orders.verdict(&snapshot).await;
        if let Some(summary) = verdict.summary() {
            return Err(PosError::payment_refused(summary, verdict.errors));
        }

        info!(order_id = %snapshot.id, revision = snapshot.revision, "Order cleared for payment");
        Ok(PaymentClearance {
            order_id: snapshot.id,
            revision: snapshot.revision,
            cleared_at: Utc::now(),
        })
    }

    /// Records the payment: consumes kit components and starts a new order.
    ///
    /// The order stays frozen until the ledger answers; cart edits in the
    /// meantime are refused. A failed or abandoned payment leaves the order
    /// as it was.
    ///
    /// ## Returns
    /// The paid order.
    pub async fn complete_payment(&self, clearance: &PaymentClearance) -> PosResult<Order> {
        let lock = self
            .cart
            .lock_for_payment(&clearance.order_id, clearance.revision)
            .ok_or_else(|| PosError::stale("payment"))?;

        let mut kit_lines = Vec::new();
        for line in &lock.order().lines {
            let kind = self
                .cache
                .resolve_kind(&line.product_id, self.catalog.as_ref())
                .await?;
            if kind.is_kit() {
                kit_lines.push(KitConsumption {
                    kit_id: line.product_id.clone(),
                    quantity: line.quantity,
                });
            }
        }

        if !kit_lines.is_empty() {
            self.ledger.consume_kits(&kit_lines).await?;
        }

        let paid = lock.complete();
        info!(order_id = %paid.id, kit_lines = kit_lines.len(), "Payment completed");
        Ok(paid)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn catalog_report(&self) -> CatalogReport {
        self.cache.report()
    }

    /// Re-reads one product's flags and BOM.
    pub async fn refresh_product(&self, product_id: &ProductId) -> PosResult<CatalogProduct> {
        Ok(self.cache.refresh(product_id, self.catalog.as_ref()).await?)
    }

    /// Line check with purpose `Diagnostic`; never touches the order.
    pub async fn diagnose(&self, product_id: &ProductId, quantity: Quantity) -> ValidationResult {
        let ctx = ValidationContext::diagnostic(self.config.context_id());
        self.lines.validate_line(product_id, quantity, &ctx).await
    }

    pub fn kit_info(&self, product_id: &ProductId) -> KitInfo {
        self.cache.kit_info(product_id)
    }
}
