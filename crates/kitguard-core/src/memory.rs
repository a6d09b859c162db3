//! # In-Memory Store
//!
//! A `HashMap`-backed implementation of every data port, for tests and for
//! running the workflow without a database.
//!
//! Besides data, the store can be told to fail individual reads
//! ([`InMemoryStore::fail_meta`], [`InMemoryStore::fail_components`],
//! [`InMemoryStore::fail_stock`]) and counts the reads it served, so tests can
//! assert that a path performed no lookups at all.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{SourceError, SourceResult};
use crate::ports::{CatalogSource, InventoryLedger, KitConsumption, LedgerError, StockSource};
use crate::quantity::Quantity;
use crate::types::{CatalogProduct, Component, KitFlags, ProductId};
use crate::verdict::Shortage;

#[derive(Debug, Default)]
struct Inner {
    /// Insertion-ordered product list: (id, name, kit_enabled).
    products: Vec<(ProductId, String, bool)>,
    boms: HashMap<ProductId, Vec<Component>>,
    stock: HashMap<ProductId, Quantity>,

    catalog_down: bool,
    failing_meta: HashSet<ProductId>,
    failing_components: HashSet<ProductId>,
    failing_stock: HashSet<ProductId>,

    meta_reads: usize,
    component_reads: usize,
    stock_reads: usize,
}

impl Inner {
    fn flags(&self, product_id: &ProductId) -> Option<KitFlags> {
        let (_, _, kit_enabled) = self.products.iter().find(|(id, _, _)| id == product_id)?;
        let has_bom = self
            .boms
            .get(product_id)
            .is_some_and(|components| !components.is_empty());
        Some(KitFlags::new(*kit_enabled, has_bom))
    }
}

/// Shared, cloneable in-memory catalog + stock + ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a product. `has_bom` follows from [`Self::set_bom`].
    pub fn add_product(&self, id: &str, name: &str, kit_enabled: bool) -> &Self {
        let mut inner = self.write();
        let id = ProductId::new(id);
        inner.products.retain(|(existing, _, _)| existing != &id);
        inner.products.push((id, name.to_string(), kit_enabled));
        self
    }

    pub fn set_bom(&self, kit_id: &str, components: Vec<Component>) -> &Self {
        self.write().boms.insert(ProductId::new(kit_id), components);
        self
    }

    pub fn set_stock(&self, product_id: &str, available: Quantity) -> &Self {
        self.write().stock.insert(ProductId::new(product_id), available);
        self
    }

    /// Current stock; missing entries read as zero.
    pub fn stock(&self, product_id: &str) -> Quantity {
        self.read()
            .stock
            .get(&ProductId::new(product_id))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_catalog_down(&self, down: bool) {
        self.write().catalog_down = down;
    }

    pub fn fail_meta(&self, product_id: &str) {
        self.write().failing_meta.insert(ProductId::new(product_id));
    }

    pub fn fail_components(&self, kit_id: &str) {
        self.write().failing_components.insert(ProductId::new(kit_id));
    }

    pub fn fail_stock(&self, product_id: &str) {
        self.write().failing_stock.insert(ProductId::new(product_id));
    }

    /// Clears every injected failure.
    pub fn heal(&self) {
        let mut inner = self.write();
        inner.catalog_down = false;
        inner.failing_meta.clear();
        inner.failing_components.clear();
        inner.failing_stock.clear();
    }

    pub fn meta_reads(&self) -> usize {
        self.read().meta_reads
    }

    pub fn component_reads(&self) -> usize {
        self.read().component_reads
    }

    pub fn stock_reads(&self) -> usize {
        self.read().stock_reads
    }
}

#[async_trait]
impl CatalogSource for InMemoryStore {
    async fn get_product_meta(&self, product_id: &ProductId) -> SourceResult<KitFlags> {
        let mut inner = self.write();
        inner.meta_reads += 1;
        if inner.catalog_down || inner.failing_meta.contains(product_id) {
            return Err(SourceError::unavailable("catalog lookup failed"));
        }
        inner
            .flags(product_id)
            .ok_or_else(|| SourceError::not_found("product", product_id.as_str()))
    }

    async fn get_components(&self, kit_id: &ProductId) -> SourceResult<Vec<Component>> {
        let mut inner = self.write();
        inner.component_reads += 1;
        if inner.catalog_down || inner.failing_components.contains(kit_id) {
            return Err(SourceError::unavailable("component fetch failed"));
        }
        Ok(inner.boms.get(kit_id).cloned().unwrap_or_default())
    }

    async fn load_catalog(&self) -> SourceResult<Vec<CatalogProduct>> {
        let inner = self.read();
        if inner.catalog_down {
            return Err(SourceError::unavailable("catalog unavailable"));
        }
        Ok(inner
            .products
            .iter()
            .map(|(id, name, _)| {
                let flags = inner.flags(id).unwrap_or_default();
                CatalogProduct::new(id.clone(), name.clone(), flags)
            })
            .collect())
    }
}

#[async_trait]
impl StockSource for InMemoryStore {
    async fn get_available_quantity(&self, product_id: &ProductId) -> SourceResult<Quantity> {
        let mut inner = self.write();
        inner.stock_reads += 1;
        if inner.failing_stock.contains(product_id) {
            return Err(SourceError::unavailable("stock read failed"));
        }
        Ok(inner.stock.get(product_id).copied().unwrap_or_default())
    }
}

#[async_trait]
impl InventoryLedger for InMemoryStore {
    async fn consume_kits(&self, lines: &[KitConsumption]) -> Result<(), LedgerError> {
        let mut inner = self.write();

        // Total need per component across all lines, first-seen order
        let mut needs: Vec<(ProductId, String, Quantity)> = Vec::new();
        for line in lines {
            let Some(components) = inner.boms.get(&line.kit_id) else {
                continue;
            };
            for component in components {
                let required = component.unit_quantity.times(line.quantity);
                match needs.iter_mut().find(|(id, _, _)| id == &component.product_id) {
                    Some((_, _, total)) => *total += required,
                    None => needs.push((
                        component.product_id.clone(),
                        component.name.clone(),
                        required,
                    )),
                }
            }
        }

        let shortages: Vec<Shortage> = needs
            .iter()
            .filter_map(|(id, name, required)| {
                let available = inner.stock.get(id).copied().unwrap_or_default();
                (available < *required).then(|| Shortage {
                    component_id: id.clone(),
                    component_name: name.clone(),
                    required: *required,
                    available,
                })
            })
            .collect();
        if !shortages.is_empty() {
            return Err(LedgerError::Insufficient(shortages));
        }

        for (id, _, required) in needs {
            let entry = inner.stock.entry(id).or_default();
            *entry = *entry - required;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_product("KIT", "Gift Box", true)
            .add_product("A", "Ribbon", false)
            .add_product("B", "Card", false)
            .set_bom(
                "KIT",
                vec![
                    Component::new("A", "Ribbon", Quantity::from_units(2)),
                    Component::new("B", "Card", Quantity::from_units(1)),
                ],
            )
            .set_stock("A", Quantity::from_units(5))
            .set_stock("B", Quantity::from_units(1));
        store
    }

    #[tokio::test]
    async fn test_flags_follow_bom_presence() {
        let store = store();
        let kit = store.get_product_meta(&"KIT".into()).await.unwrap();
        assert!(kit.is_kit());

        let plain = store.get_product_meta(&"A".into()).await.unwrap();
        assert_eq!(plain, KitFlags::new(false, false));

        let missing = store.get_product_meta(&"NOPE".into()).await;
        assert!(matches!(missing, Err(SourceError::NotFound { .. })));
        assert_eq!(store.meta_reads(), 3);
    }

    #[tokio::test]
    async fn test_consume_kits_is_all_or_nothing() {
        let store = store();
        let lines = vec![
            KitConsumption {
                kit_id: "KIT".into(),
                quantity: Quantity::from_units(1),
            },
            KitConsumption {
                kit_id: "KIT".into(),
                quantity: Quantity::from_units(1),
            },
        ];

        // Two kits need 2 cards, only 1 available
        let err = store.consume_kits(&lines).await.unwrap_err();
        match err {
            LedgerError::Insufficient(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].describe(), "Card: available=1, required=2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.stock("A"), Quantity::from_units(5));
        assert_eq!(store.stock("B"), Quantity::from_units(1));

        store.consume_kits(&lines[..1]).await.unwrap();
        assert_eq!(store.stock("A"), Quantity::from_units(3));
        assert_eq!(store.stock("B"), Quantity::zero());
        assert_eq!(store.stock("KIT"), Quantity::zero());
    }

    #[tokio::test]
    async fn test_injected_failures_heal() {
        let store = store();
        store.fail_stock("A");
        assert!(store.get_available_quantity(&"A".into()).await.is_err());

        store.heal();
        assert_eq!(
            store.get_available_quantity(&"A".into()).await.unwrap(),
            Quantity::from_units(5)
        );
    }
}
