//! # BOM Expander
//!
//! Turns a resolved [`ProductKind`] into the kit's direct component list.
//!
//! ## Expansion Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PlainItem ───────────────────────────────────────► Expansion::NotAKit  │
//! │                                                                         │
//! │  KitItem { components: Some(list) } ──────────────► Components(list)    │
//! │                                                                         │
//! │  KitItem { components: None }                                           │
//! │     │                                                                   │
//! │     ├─ cache filled meanwhile? ──yes──────────────► Components(list)    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  CatalogSource::get_components(kit_id)                                  │
//! │     ├─ Err ───────────────────────► BomFailure::ExpansionUnavailable    │
//! │     ├─ corrupt list ──────────────► BomFailure::ExpansionUnavailable    │
//! │     └─ Ok ──► store_components ───────────────────► Components(list)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expansion is one level deep. A component that is itself a kit is
//! treated as a plain product with its own on-hand stock.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::CatalogCache;
use crate::error::BomFailure;
use crate::ports::CatalogSource;
use crate::types::{Component, ProductId, ProductKind};
use crate::validation::validate_components;

/// Result of expanding a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Not a kit: skip the component check.
    NotAKit,
    /// Direct components, in BOM order (possibly empty).
    Components(Vec<Component>),
}

/// Expands kits through the session cache, fetching lazily.
#[derive(Clone)]
pub struct BomExpander {
    cache: Arc<CatalogCache>,
    catalog: Arc<dyn CatalogSource>,
}

impl BomExpander {
    pub fn new(cache: Arc<CatalogCache>, catalog: Arc<dyn CatalogSource>) -> Self {
        BomExpander { cache, catalog }
    }

    pub async fn expand(&self, kind: &ProductKind) -> Result<Expansion, BomFailure> {
        let kit_id = match kind {
            ProductKind::PlainItem => return Ok(Expansion::NotAKit),
            ProductKind::KitItem {
                components: Some(components),
                ..
            } => return Ok(Expansion::Components(components.clone())),
            ProductKind::KitItem { kit_id, .. } => kit_id,
        };

        if let Some(components) = self.cache.get(kit_id).and_then(|p| p.components) {
            return Ok(Expansion::Components(components));
        }

        let components = self.fetch(kit_id).await?;
        self.cache.store_components(kit_id, components.clone());
        Ok(Expansion::Components(components))
    }

    async fn fetch(&self, kit_id: &ProductId) -> Result<Vec<Component>, BomFailure> {
        let components = self.catalog.get_components(kit_id).await.map_err(|e| {
            warn!(kit_id = %kit_id, error = %e, "Component fetch failed");
            BomFailure::ExpansionUnavailable {
                product_id: kit_id.clone(),
                reason: e.to_string(),
            }
        })?;

        validate_components(kit_id, &components).map_err(|e| {
            warn!(kit_id = %kit_id, error = %e, "Corrupt bill of materials");
            BomFailure::ExpansionUnavailable {
                product_id: kit_id.clone(),
                reason: e.to_string(),
            }
        })?;

        debug!(kit_id = %kit_id, count = components.len(), "Components fetched");
        Ok(components)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::quantity::Quantity;
    use crate::types::{CatalogProduct, KitFlags};

    fn setup(store: &InMemoryStore) -> (Arc<CatalogCache>, BomExpander) {
        let cache = Arc::new(CatalogCache::new());
        cache.insert(CatalogProduct::new("KIT", "Gift Box", KitFlags::new(true, true)));
        let expander = BomExpander::new(cache.clone(), Arc::new(store.clone()));
        (cache, expander)
    }

    fn kit_kind() -> ProductKind {
        ProductKind::KitItem {
            kit_id: ProductId::new("KIT"),
            components: None,
        }
    }

    #[tokio::test]
    async fn test_plain_item_is_not_a_kit() {
        let store = InMemoryStore::new();
        let (_, expander) = setup(&store);

        let expansion = expander.expand(&ProductKind::PlainItem).await.unwrap();

        assert_eq!(expansion, Expansion::NotAKit);
        assert_eq!(store.component_reads(), 0);
    }

    #[tokio::test]
    async fn test_lazy_fetch_is_cached() {
        let store = InMemoryStore::new();
        store.add_product("KIT", "Gift Box", true).set_bom(
            "KIT",
            vec![Component::new("A", "Ribbon", Quantity::from_units(2))],
        );
        let (cache, expander) = setup(&store);

        let first = expander.expand(&kit_kind()).await.unwrap();
        let second = expander.expand(&kit_kind()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.component_reads(), 1);
        assert!(cache.get(&"KIT".into()).unwrap().components.is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_treated_as_plain() {
        let store = InMemoryStore::new();
        store.add_product("KIT", "Gift Box", true);
        store.fail_components("KIT");
        let (cache, expander) = setup(&store);

        let err = expander.expand(&kit_kind()).await.unwrap_err();

        assert!(matches!(err, BomFailure::ExpansionUnavailable { .. }));
        assert!(cache.get(&"KIT".into()).unwrap().components.is_none());
    }

    #[tokio::test]
    async fn test_self_referencing_bom_is_unavailable() {
        let store = InMemoryStore::new();
        store.add_product("KIT", "Gift Box", true).set_bom(
            "KIT",
            vec![Component::new("KIT", "Gift Box", Quantity::from_units(1))],
        );
        let (cache, expander) = setup(&store);

        let err = expander.expand(&kit_kind()).await.unwrap_err();

        assert!(matches!(err, BomFailure::ExpansionUnavailable { .. }));
        assert!(cache.get(&"KIT".into()).unwrap().components.is_none());
    }

    #[tokio::test]
    async fn test_empty_bom_expands_to_nothing() {
        let store = InMemoryStore::new();
        store.add_product("KIT", "Gift Box", true);
        let (_, expander) = setup(&store);

        let expansion = expander.expand(&kit_kind()).await.unwrap();

        assert_eq!(expansion, Expansion::Components(Vec::new()));
    }
}
