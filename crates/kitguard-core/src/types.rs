//! # Domain Types
//!
//! Core domain types used throughout Kitguard.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │ CatalogProduct  │   │   Component     │   │     Order       │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id             │   │  product_id     │   │  id (UUID)      │        │
//! │  │  name           │   │  name snapshot  │   │  revision       │        │
//! │  │  flags?         │   │  unit_quantity  │   │  lines[]        │        │
//! │  │  components?    │   └─────────────────┘   └────────┬────────┘        │
//! │  └────────┬────────┘                                  │                 │
//! │           │ resolve                          ┌────────▼────────┐        │
//! │  ┌────────▼────────┐                         │   OrderLine     │        │
//! │  │  ProductKind    │                         │  ─────────────  │        │
//! │  │  PlainItem      │                         │  id (UUID)      │        │
//! │  │  KitItem{..}    │                         │  product_id     │        │
//! │  └─────────────────┘                         │  quantity       │        │
//! │                                              └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unset Flags
//! A `CatalogProduct` may carry no kit flags yet (`flags: None`). Such a
//! record cannot be validated: it must be resolved into a [`ProductKind`]
//! first, which has no "unknown" state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, InputError};
use crate::quantity::Quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque product identifier as issued by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        ProductId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        ProductId(id)
    }
}

/// Identity of one in-progress order (UUID v4).
///
/// A cleared cart gets a fresh `OrderId`; results computed for the previous
/// id are stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct OrderId(String);

impl OrderId {
    pub fn generate() -> Self {
        OrderId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an order line (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct LineId(String);

impl LineId {
    pub fn generate() -> Self {
        LineId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineId {
    fn from(id: &str) -> Self {
        LineId(id.to_string())
    }
}

// =============================================================================
// Kit Flags
// =============================================================================

/// The two catalog flags that together decide kit behavior.
///
/// ## Truth Table
/// ```text
/// kit_enabled  has_bom   behaves as
/// ───────────  ───────   ──────────
///    false      false    PlainItem
///    false      true     PlainItem   (BOM exists, store opted out)
///    true       false    PlainItem   (store opted in, no BOM defined)
///    true       true     KitItem
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KitFlags {
    /// The store wants kit behavior for this product.
    pub kit_enabled: bool,
    /// The product actually has a bill of materials.
    pub has_bom: bool,
}

impl KitFlags {
    pub const fn new(kit_enabled: bool, has_bom: bool) -> Self {
        KitFlags {
            kit_enabled,
            has_bom,
        }
    }

    #[inline]
    pub const fn is_kit(&self) -> bool {
        self.kit_enabled && self.has_bom
    }
}

// =============================================================================
// Component
// =============================================================================

/// One direct component of a kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Component {
    /// The component's own product id.
    pub product_id: ProductId,

    /// Display name captured when the BOM was read (snapshot).
    pub name: String,

    /// Required quantity of this component per one kit unit.
    #[ts(as = "String")]
    pub unit_quantity: Quantity,
}

impl Component {
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_quantity: Quantity,
    ) -> Self {
        Component {
            product_id: product_id.into(),
            name: name.into(),
            unit_quantity,
        }
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// Session-level product record held by the catalog cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogProduct {
    pub id: ProductId,

    /// Display name shown to the cashier.
    pub name: String,

    /// Kit flags; `None` until resolved.
    pub flags: Option<KitFlags>,

    /// Direct components; `None` until loaded.
    pub components: Option<Vec<Component>>,
}

impl CatalogProduct {
    /// A product whose flags are known but whose components are not loaded.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, flags: KitFlags) -> Self {
        CatalogProduct {
            id: id.into(),
            name: name.into(),
            flags: Some(flags),
            components: None,
        }
    }

    /// A product whose kit flags have not been read yet.
    pub fn unresolved(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        CatalogProduct {
            id: id.into(),
            name: name.into(),
            flags: None,
            components: None,
        }
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = Some(components);
        self
    }

    /// The validation-ready view of this record, if the flags are known.
    pub fn kind(&self) -> Option<ProductKind> {
        let flags = self.flags?;
        if flags.is_kit() {
            Some(ProductKind::KitItem {
                kit_id: self.id.clone(),
                components: self.components.clone(),
            })
        } else {
            Some(ProductKind::PlainItem)
        }
    }
}

// =============================================================================
// Product Kind
// =============================================================================

/// Resolved kit behavior of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductKind {
    /// Sold from its own stock; never expanded.
    PlainItem,

    /// Sold by consuming its components.
    KitItem {
        kit_id: ProductId,
        /// `None` while the component list has not been fetched.
        components: Option<Vec<Component>>,
    },
}

impl ProductKind {
    pub fn is_kit(&self) -> bool {
        matches!(self, ProductKind::KitItem { .. })
    }
}

// =============================================================================
// Kit Info
// =============================================================================

/// Kit summary shown next to an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KitInfo {
    pub is_kit: bool,
    pub components: Vec<Component>,
    pub total_components: usize,
}

impl KitInfo {
    pub fn plain() -> Self {
        KitInfo {
            is_kit: false,
            components: Vec::new(),
            total_components: 0,
        }
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line of an in-progress order.
///
/// Lines are unique by `product_id`: adding the same product again merges
/// into the existing line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: LineId,
    pub product_id: ProductId,

    /// Product name at time of adding (frozen).
    pub product_name: String,

    #[ts(as = "String")]
    pub quantity: Quantity,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// An in-progress order (the cart).
///
/// ## Revision
/// Every successful mutation bumps `revision`. A payment clearance records
/// `(id, revision)`; if either moved, the clearance is stale.
///
/// ## Invariants
/// - At most `MAX_CART_ITEMS` lines
/// - Every line quantity is positive and at most `MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: OrderId,
    pub revision: u64,
    pub lines: Vec<OrderLine>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

impl Order {
    /// Creates a new empty order with a fresh id.
    pub fn new() -> Self {
        Order {
            id: OrderId::generate(),
            revision: 0,
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn line(&self, line_id: &LineId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| &l.id == line_id)
    }

    pub fn line_for_product(&self, product_id: &ProductId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Quantity the product's line would hold after adding `quantity`.
    pub fn quantity_after_add(&self, product_id: &ProductId, quantity: Quantity) -> Quantity {
        match self.line_for_product(product_id) {
            Some(line) => line.quantity + quantity,
            None => quantity,
        }
    }

    /// Adds a product or merges into its existing line.
    ///
    /// ## Returns
    /// The id of the line that now holds the product.
    pub fn add(
        &mut self,
        product_id: &ProductId,
        product_name: &str,
        quantity: Quantity,
    ) -> CoreResult<LineId> {
        if !quantity.is_positive() {
            return Err(InputError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if let Some(line) = self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            let new_qty = line.quantity + quantity;
            check_line_quantity(new_qty)?;
            line.quantity = new_qty;
            let id = line.id.clone();
            self.revision += 1;
            return Ok(id);
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::OrderTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        check_line_quantity(quantity)?;

        let line = OrderLine {
            id: LineId::generate(),
            product_id: product_id.clone(),
            product_name: product_name.to_string(),
            quantity,
            added_at: Utc::now(),
        };
        let id = line.id.clone();
        self.lines.push(line);
        self.revision += 1;
        Ok(id)
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, line_id: &LineId, quantity: Quantity) -> CoreResult<()> {
        if quantity.is_zero() {
            return self.remove_line(line_id);
        }
        if !quantity.is_positive() {
            return Err(InputError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        check_line_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        line.quantity = quantity;
        self.revision += 1;
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: &LineId) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| &l.id != line_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            self.revision += 1;
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn check_line_quantity(quantity: Quantity) -> CoreResult<()> {
    if quantity > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity.to_string(),
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kit_flags_truth_table() {
        assert!(!KitFlags::new(false, false).is_kit());
        assert!(!KitFlags::new(false, true).is_kit());
        assert!(!KitFlags::new(true, false).is_kit());
        assert!(KitFlags::new(true, true).is_kit());
    }

    #[test]
    fn test_catalog_product_kind() {
        let plain = CatalogProduct::new("P1", "Water", KitFlags::new(true, false));
        assert_eq!(plain.kind(), Some(ProductKind::PlainItem));

        let unknown = CatalogProduct::unresolved("P2", "Mystery");
        assert_eq!(unknown.kind(), None);

        let kit = CatalogProduct::new("K1", "Gift Box", KitFlags::new(true, true));
        assert!(matches!(
            kit.kind(),
            Some(ProductKind::KitItem { components: None, .. })
        ));
    }

    #[test]
    fn test_order_add_merges_lines() {
        let mut order = Order::new();
        let pid = ProductId::new("K1");

        let first = order.add(&pid, "Gift Box", Quantity::from_units(2)).unwrap();
        let second = order.add(&pid, "Gift Box", Quantity::from_units(3)).unwrap();

        assert_eq!(first, second);
        assert_eq!(order.len(), 1);
        assert_eq!(order.lines[0].quantity, Quantity::from_units(5));
        assert_eq!(order.revision, 2);
    }

    #[test]
    fn test_quantity_after_add() {
        let mut order = Order::new();
        let pid = ProductId::new("K1");
        assert_eq!(
            order.quantity_after_add(&pid, Quantity::from_units(1)),
            Quantity::from_units(1)
        );

        order.add(&pid, "Gift Box", Quantity::from_units(2)).unwrap();
        assert_eq!(
            order.quantity_after_add(&pid, Quantity::from_units(1)),
            Quantity::from_units(3)
        );
    }

    #[test]
    fn test_order_limits() {
        let mut order = Order::new();
        let pid = ProductId::new("P1");

        let err = order.add(&pid, "Water", Quantity::from_units(1000)).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { max: 999, .. }));

        let err = order.add(&pid, "Water", Quantity::zero()).unwrap_err();
        assert!(matches!(err, CoreError::Input(_)));
        assert!(order.is_empty());
        assert_eq!(order.revision, 0);

        for i in 0..MAX_CART_ITEMS {
            order
                .add(&ProductId::new(format!("P{i}")), "x", Quantity::from_units(1))
                .unwrap();
        }
        let err = order
            .add(&ProductId::new("ONE-TOO-MANY"), "x", Quantity::from_units(1))
            .unwrap_err();
        assert!(matches!(err, CoreError::OrderTooLarge { .. }));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut order = Order::new();
        let line = order
            .add(&ProductId::new("P1"), "Water", Quantity::from_units(2))
            .unwrap();

        order.set_quantity(&line, Quantity::from_units(4)).unwrap();
        assert_eq!(order.line(&line).unwrap().quantity, Quantity::from_units(4));

        order.set_quantity(&line, Quantity::zero()).unwrap();
        assert!(order.line(&line).is_none());
        assert!(matches!(
            order.remove_line(&line),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_new_orders_have_distinct_ids() {
        assert_ne!(Order::new().id, Order::new().id);
    }

    #[test]
    fn test_component_serializes_quantity_as_string() {
        let component = Component::new("C1", "Ribbon", Quantity::from_milli(2500));
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["product_id"], "C1");
        assert_eq!(json["unit_quantity"], "2.5");
    }
}
