//! # kitguard-core: Kit Stock Rule Engine
//!
//! This crate is the **heart** of Kitguard. It decides whether a kit
//! (bill-of-materials product) can be sold at a requested quantity, and
//! whether an order is payable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitguard Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │              kitguard-pos (cart / payment workflow)             │    │
//! │  │   add_to_cart ──► line gate      begin_payment ──► order gate   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │              ★ kitguard-core (THIS CRATE) ★                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   cache   │─►│    bom    │─►│ shortage  │─►│ line/order│    │    │
//! │  │   │ flags,BOM │  │ Expander  │  │ Evaluator │  │ validators│    │    │
//! │  │   └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └───────────┘    │    │
//! │  │         └──────────────┴──────┬───────┘                         │    │
//! │  │                          ports (traits)                         │    │
//! │  └───────────────────────────────┬─────────────────────────────────┘    │
//! │                                  │                                      │
//! │  ┌───────────────────────────────▼─────────────────────────────────┐    │
//! │  │  kitguard-db (SQLite)   │   stock-api over HTTP (remote mode)   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (products, components, orders)
//! - [`quantity`] - Fixed-point quantities (no floating point!)
//! - [`ports`] - Async traits for catalog, stock, remote check, ledger
//! - [`cache`] - Session-owned catalog cache
//! - [`bom`] - BOM Expander
//! - [`shortage`] - Shortage Evaluator
//! - [`line`] - Line Validator and policy
//! - [`order`] - Order Validator
//! - [`verdict`] - Results handed to the presentation layer
//! - [`error`] - Domain error types
//! - [`validation`] - Input and BOM sanity checks
//! - [`memory`] - In-memory implementation of the ports
//!
//! ## Design Principles
//!
//! 1. **No I/O**: data arrives only through the traits in [`ports`]
//! 2. **Integer Quantities**: milli-units in an i64, never f64
//! 3. **Never Throws**: a line check always ends in a `ValidationResult`
//! 4. **Fail Closed**: anything unknown about a kit blocks the sale
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use kitguard_core::{CatalogCache, Component, LineValidator, ValidationContext, ValidationPolicy};
//! use kitguard_core::memory::InMemoryStore;
//! use kitguard_core::quantity::Quantity;
//!
//! # tokio_test_block(async {
//! let store = InMemoryStore::new();
//! store
//!     .add_product("KIT", "Gift Box", true)
//!     .set_bom("KIT", vec![Component::new("A", "Ribbon", Quantity::from_units(2))])
//!     .set_stock("A", Quantity::from_units(5));
//!
//! let validator = LineValidator::new(
//!     Arc::new(CatalogCache::new()),
//!     Arc::new(store.clone()),
//!     Arc::new(store.clone()),
//!     ValidationPolicy::default(),
//! );
//!
//! let ctx = ValidationContext::add_to_cart("store-1");
//! let result = validator.validate_line(&"KIT".into(), Quantity::from_units(3), &ctx).await;
//! assert_eq!(result.error.as_deref(), Some("Ribbon: available=5, required=6"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bom;
pub mod cache;
pub mod error;
pub mod line;
pub mod memory;
pub mod order;
pub mod ports;
pub mod quantity;
pub mod shortage;
pub mod types;
pub mod validation;
pub mod verdict;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kitguard_core::Quantity` instead of
// `use kitguard_core::quantity::Quantity`

pub use bom::{BomExpander, Expansion};
pub use cache::{CatalogCache, CatalogReport};
pub use error::{BomFailure, CoreError, InputError, SourceError, SourceResult};
pub use line::{
    CheckPurpose, LineValidator, MetadataPolicy, ValidationContext, ValidationMode,
    ValidationPolicy,
};
pub use order::OrderValidator;
pub use ports::{
    CatalogSource, InventoryLedger, KitConsumption, LedgerError, RemoteStockValidator,
    StockSource,
};
pub use quantity::Quantity;
pub use shortage::ShortageEvaluator;
pub use types::*;
pub use verdict::{
    OrderVerdict, Shortage, StockCheckRequest, ValidationError, ValidationResult,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line, in whole units
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;
