//! # Shortage Evaluator
//!
//! Compares what a kit line needs against live component stock.
//!
//! ```text
//! for each component (BOM order):
//!     required  = unit_quantity × kit_quantity
//!     available = StockSource::get_available_quantity(component)   ◄ read now
//!     available < required  →  Shortage
//! ```
//!
//! `available == required` is not a shortage. Reads are sequential so the
//! shortages come back in BOM order.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::BomFailure;
use crate::ports::StockSource;
use crate::quantity::Quantity;
use crate::types::Component;
use crate::verdict::Shortage;

#[derive(Clone)]
pub struct ShortageEvaluator {
    stock: Arc<dyn StockSource>,
}

impl ShortageEvaluator {
    pub fn new(stock: Arc<dyn StockSource>) -> Self {
        ShortageEvaluator { stock }
    }

    /// Returns every short component; empty means the line is covered.
    ///
    /// ## Errors
    /// `BomFailure::StockUnavailable` on the first failed stock read.
    pub async fn evaluate(
        &self,
        components: &[Component],
        kit_quantity: Quantity,
    ) -> Result<Vec<Shortage>, BomFailure> {
        let mut shortages = Vec::new();

        for component in components {
            let required = component.unit_quantity.times(kit_quantity);
            let available = self
                .stock
                .get_available_quantity(&component.product_id)
                .await
                .map_err(|source| {
                    warn!(component_id = %component.product_id, error = %source, "Stock read failed");
                    BomFailure::StockUnavailable {
                        component_id: component.product_id.clone(),
                        source,
                    }
                })?;

            trace!(
                component_id = %component.product_id,
                %required,
                %available,
                "Component checked"
            );

            if available < required {
                shortages.push(Shortage {
                    component_id: component.product_id.clone(),
                    component_name: component.name.clone(),
                    required,
                    available,
                });
            }
        }

        Ok(shortages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn evaluator(store: &InMemoryStore) -> ShortageEvaluator {
        ShortageEvaluator::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_required_is_unit_times_kit_quantity() {
        let store = InMemoryStore::new();
        store.set_stock("A", Quantity::from_units(5));
        let components = vec![Component::new("A", "A", Quantity::from_units(2))];

        let shortages = evaluator(&store)
            .evaluate(&components, Quantity::from_units(3))
            .await
            .unwrap();

        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].required, Quantity::from_units(6));
        assert_eq!(shortages[0].available, Quantity::from_units(5));
    }

    #[tokio::test]
    async fn test_only_short_components_are_reported() {
        let store = InMemoryStore::new();
        store
            .set_stock("A", Quantity::from_units(10))
            .set_stock("B", Quantity::zero());
        let components = vec![
            Component::new("A", "A", Quantity::from_units(1)),
            Component::new("B", "B", Quantity::from_units(1)),
        ];

        let shortages = evaluator(&store)
            .evaluate(&components, Quantity::from_units(1))
            .await
            .unwrap();

        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].component_name, "B");
    }

    #[tokio::test]
    async fn test_exact_stock_is_enough() {
        let store = InMemoryStore::new();
        store.set_stock("A", Quantity::from_units(6));
        let components = vec![Component::new("A", "A", Quantity::from_units(2))];

        let shortages = evaluator(&store)
            .evaluate(&components, Quantity::from_units(3))
            .await
            .unwrap();

        assert!(shortages.is_empty());
    }

    #[tokio::test]
    async fn test_fractional_requirements() {
        let store = InMemoryStore::new();
        store.set_stock("A", Quantity::from_milli(1_200));
        let components = vec![Component::new("A", "Flour", Quantity::from_milli(250))];

        let shortages = evaluator(&store)
            .evaluate(&components, Quantity::from_units(5))
            .await
            .unwrap();

        assert_eq!(shortages[0].describe(), "Flour: available=1.2, required=1.25");
    }

    #[tokio::test]
    async fn test_stock_failure_is_reported() {
        let store = InMemoryStore::new();
        store.fail_stock("B");
        let components = vec![
            Component::new("A", "A", Quantity::from_units(1)),
            Component::new("B", "B", Quantity::from_units(1)),
        ];

        let err = evaluator(&store)
            .evaluate(&components, Quantity::from_units(1))
            .await
            .unwrap_err();

        assert!(matches!(err, BomFailure::StockUnavailable { .. }));
    }
}
