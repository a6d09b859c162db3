//! # Catalog Cache
//!
//! Session-owned, read-through cache of product kit flags and component
//! lists.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session start                                                          │
//! │    preload(source) ──► load_catalog() ──► insert every product          │
//! │                   └──► get_components() per kit (failure tolerated)     │
//! │                                                                         │
//! │  Validation                                                             │
//! │    resolve_kind(id) ──► flags cached? ──yes──► ProductKind              │
//! │                             │ no                                        │
//! │                             ▼                                           │
//! │                   get_product_meta() ──► write back ──► ProductKind     │
//! │                                                                         │
//! │  BOM Expander                                                           │
//! │    store_components(id, list)   write-once per session in practice      │
//! │                                                                         │
//! │  Diagnostics                                                            │
//! │    refresh(id) ──► re-fetch flags + components, overwrite               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The map sits behind a `RwLock` that is never held across an `.await`.
//! Two validations racing to fill the same entry write equal values, so the
//! last write wins without losing anything.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{BomFailure, SourceResult};
use crate::ports::CatalogSource;
use crate::types::{CatalogProduct, Component, KitInfo, ProductId, ProductKind};
use crate::validation::validate_components;

/// Counts describing what the cache currently knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogReport {
    /// Products held.
    pub total: usize,
    /// Products whose resolved flags make them kits.
    pub kit_products: usize,
    /// Products whose flags are still unknown.
    pub unresolved: usize,
}

/// The explicit catalog cache.
///
/// Owned by the session (usually behind an `Arc`) and passed to the
/// validators.
#[derive(Debug, Default)]
pub struct CatalogCache {
    products: RwLock<HashMap<ProductId, CatalogProduct>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_products<R>(&self, f: impl FnOnce(&HashMap<ProductId, CatalogProduct>) -> R) -> R {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        f(&products)
    }

    fn with_products_mut<R>(
        &self,
        f: impl FnOnce(&mut HashMap<ProductId, CatalogProduct>) -> R,
    ) -> R {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut products)
    }

    /// Inserts or replaces a product record.
    pub fn insert(&self, product: CatalogProduct) {
        self.with_products_mut(|products| {
            products.insert(product.id.clone(), product);
        });
    }

    pub fn get(&self, product_id: &ProductId) -> Option<CatalogProduct> {
        self.with_products(|products| products.get(product_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.with_products(HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display name of a product, falling back to its id.
    pub fn display_name(&self, product_id: &ProductId) -> String {
        self.with_products(|products| {
            products
                .get(product_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| product_id.to_string())
        })
    }

    /// Session load: every product, then the component list of every kit.
    ///
    /// ## Errors
    /// Only a failed `load_catalog` is an error. A kit whose components
    /// cannot be fetched (or fail sanity checks) stays cached with its
    /// components unloaded; the expander retries lazily.
    pub async fn preload(&self, source: &dyn CatalogSource) -> SourceResult<CatalogReport> {
        let catalog = source.load_catalog().await?;

        let kit_ids: Vec<ProductId> = catalog
            .iter()
            .filter(|p| p.flags.is_some_and(|f| f.is_kit()))
            .map(|p| p.id.clone())
            .collect();

        self.with_products_mut(|products| {
            for product in catalog {
                products.insert(product.id.clone(), product);
            }
        });

        for kit_id in &kit_ids {
            let fetched = source
                .get_components(kit_id)
                .await
                .map_err(|e| e.to_string())
                .and_then(|components| {
                    validate_components(kit_id, &components)
                        .map(|()| components)
                        .map_err(|e| e.to_string())
                });

            match fetched {
                Ok(components) => self.store_components(kit_id, components),
                Err(reason) => {
                    warn!(kit_id = %kit_id, reason = %reason, "Kit components not preloaded");
                }
            }
        }

        let report = self.report();
        info!(
            total = report.total,
            kits = report.kit_products,
            unresolved = report.unresolved,
            "Catalog preloaded"
        );
        Ok(report)
    }

    /// Resolves a product into a [`ProductKind`], fetching unset flags.
    ///
    /// A product missing from the cache is looked up the same way and
    /// cached under its id as display name.
    pub async fn resolve_kind(
        &self,
        product_id: &ProductId,
        source: &dyn CatalogSource,
    ) -> Result<ProductKind, BomFailure> {
        if let Some(kind) = self.with_products(|products| products.get(product_id)?.kind()) {
            return Ok(kind);
        }

        let flags = source
            .get_product_meta(product_id)
            .await
            .map_err(|source| BomFailure::MetadataUnresolved {
                product_id: product_id.clone(),
                source,
            })?;

        debug!(
            product_id = %product_id,
            kit_enabled = flags.kit_enabled,
            has_bom = flags.has_bom,
            "Kit flags resolved"
        );

        let product = self.with_products_mut(|products| {
            let entry = products
                .entry(product_id.clone())
                .or_insert_with(|| CatalogProduct::unresolved(product_id.clone(), product_id.as_str()));
            entry.flags = Some(flags);
            entry.clone()
        });

        Ok(product.kind().unwrap_or(ProductKind::PlainItem))
    }

    /// Caches a fetched component list on the product record.
    pub fn store_components(&self, product_id: &ProductId, components: Vec<Component>) {
        self.with_products_mut(|products| {
            if let Some(product) = products.get_mut(product_id) {
                product.components = Some(components);
            }
        });
    }

    /// Re-fetches flags and, for kits, components; overwrites the cache.
    pub async fn refresh(
        &self,
        product_id: &ProductId,
        source: &dyn CatalogSource,
    ) -> Result<CatalogProduct, BomFailure> {
        let flags = source
            .get_product_meta(product_id)
            .await
            .map_err(|source| BomFailure::MetadataUnresolved {
                product_id: product_id.clone(),
                source,
            })?;

        let components = if flags.is_kit() {
            let components = source.get_components(product_id).await.map_err(|e| {
                BomFailure::ExpansionUnavailable {
                    product_id: product_id.clone(),
                    reason: e.to_string(),
                }
            })?;
            validate_components(product_id, &components).map_err(|e| {
                BomFailure::ExpansionUnavailable {
                    product_id: product_id.clone(),
                    reason: e.to_string(),
                }
            })?;
            Some(components)
        } else {
            None
        };

        let product = self.with_products_mut(|products| {
            let entry = products
                .entry(product_id.clone())
                .or_insert_with(|| CatalogProduct::unresolved(product_id.clone(), product_id.as_str()));
            entry.flags = Some(flags);
            entry.components = components;
            entry.clone()
        });

        info!(product_id = %product_id, is_kit = flags.is_kit(), "Product refreshed");
        Ok(product)
    }

    pub fn report(&self) -> CatalogReport {
        self.with_products(|products| CatalogReport {
            total: products.len(),
            kit_products: products
                .values()
                .filter(|p| p.flags.is_some_and(|f| f.is_kit()))
                .count(),
            unresolved: products.values().filter(|p| p.flags.is_none()).count(),
        })
    }

    /// Kit summary for line display. Never performs I/O.
    pub fn kit_info(&self, product_id: &ProductId) -> KitInfo {
        self.with_products(|products| match products.get(product_id).and_then(|p| p.kind()) {
            Some(ProductKind::KitItem { components, .. }) => {
                let components = components.unwrap_or_default();
                KitInfo {
                    is_kit: true,
                    total_components: components.len(),
                    components,
                }
            }
            _ => KitInfo::plain(),
        })
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
    use crate::types::KitFlags;

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_product("KIT", "Gift Box", true)
            .add_product("KIT2", "Party Pack", true)
            .add_product("A", "Ribbon", false)
            .set_bom("KIT", vec![Component::new("A", "Ribbon", Quantity::from_units(2))])
            .set_bom("KIT2", vec![Component::new("A", "Ribbon", Quantity::from_units(1))]);
        store
    }

    #[tokio::test]
    async fn test_preload_caches_flags_and_components() {
        let store = store();
        let cache = CatalogCache::new();

        let report = cache.preload(&store).await.unwrap();

        assert_eq!(
            report,
            CatalogReport {
                total: 3,
                kit_products: 2,
                unresolved: 0
            }
        );
        let kit = cache.get(&"KIT".into()).unwrap();
        assert_eq!(kit.components.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preload_tolerates_component_failure() {
        let store = store();
        store.fail_components("KIT2");
        let cache = CatalogCache::new();

        let report = cache.preload(&store).await.unwrap();

        assert_eq!(report.kit_products, 2);
        let kit2 = cache.get(&"KIT2".into()).unwrap();
        assert!(kit2.components.is_none());
        assert!(matches!(
            cache.resolve_kind(&"KIT2".into(), &store).await.unwrap(),
            ProductKind::KitItem {
                components: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_preload_fails_when_catalog_is_down() {
        let store = store();
        store.set_catalog_down(true);
        assert!(CatalogCache::new().preload(&store).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_kind_fetches_unset_flags_once() {
        let store = store();
        let cache = CatalogCache::new();
        cache.insert(CatalogProduct::unresolved("KIT", "Gift Box"));
        assert_eq!(cache.report().unresolved, 1);

        let kind = cache.resolve_kind(&"KIT".into(), &store).await.unwrap();
        assert!(kind.is_kit());
        assert_eq!(store.meta_reads(), 1);

        cache.resolve_kind(&"KIT".into(), &store).await.unwrap();
        assert_eq!(store.meta_reads(), 1);
        assert_eq!(cache.report().unresolved, 0);
        assert_eq!(cache.display_name(&"KIT".into()), "Gift Box");
    }

    #[tokio::test]
    async fn test_resolve_kind_unknown_product_is_looked_up() {
        let store = store();
        let cache = CatalogCache::new();

        let kind = cache.resolve_kind(&"A".into(), &store).await.unwrap();

        assert_eq!(kind, ProductKind::PlainItem);
        assert_eq!(cache.display_name(&"A".into()), "A");
    }

    #[tokio::test]
    async fn test_resolve_kind_failure_is_metadata_unresolved() {
        let store = store();
        store.fail_meta("KIT");
        let cache = CatalogCache::new();
        cache.insert(CatalogProduct::unresolved("KIT", "Gift Box"));

        let err = cache.resolve_kind(&"KIT".into(), &store).await.unwrap_err();

        assert!(matches!(err, BomFailure::MetadataUnresolved { .. }));
        assert!(cache.get(&"KIT".into()).unwrap().flags.is_none());
    }

    #[tokio::test]
    async fn test_refresh_overwrites_stale_record() {
        let store = store();
        let cache = CatalogCache::new();
        cache.insert(CatalogProduct::new("KIT", "Gift Box", KitFlags::new(false, false)));
        assert!(!cache.kit_info(&"KIT".into()).is_kit);

        let product = cache.refresh(&"KIT".into(), &store).await.unwrap();

        assert_eq!(product.flags, Some(KitFlags::new(true, true)));
        let info = cache.kit_info(&"KIT".into());
        assert!(info.is_kit);
        assert_eq!(info.total_components, 1);
    }

    #[test]
    fn test_kit_info_for_unknown_product_is_plain() {
        let cache = CatalogCache::new();
        assert_eq!(cache.kit_info(&"X".into()), KitInfo::plain());
        assert!(cache.is_empty());
    }
}
