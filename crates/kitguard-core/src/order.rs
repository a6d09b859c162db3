//! # Order Validator
//!
//! Runs the line check over every order line right before payment.
//!
//! ```text
//! Order lines          Line verdicts            Result
//! ───────────          ─────────────            ──────
//! Gift Box ×3   ──►    invalid (Ribbon short) ─► ValidationError #1
//! Water    ×5   ──►    valid (plain)           ─► (nothing)
//! Party    ×1   ──►    invalid (unavailable)  ─► ValidationError #2
//! ```
//!
//! The result keeps line order whether lines run one after another or
//! concurrently (`join_all` yields in input order).

use futures_util::future::join_all;
use tracing::{debug, info};

use crate::line::{LineValidator, ValidationContext};
use crate::types::{Order, OrderLine};
use crate::verdict::{OrderVerdict, ValidationError, ValidationResult};

#[derive(Clone)]
pub struct OrderValidator {
    line: LineValidator,
    context_id: String,
}

impl OrderValidator {
    pub fn new(line: LineValidator, context_id: impl Into<String>) -> Self {
        OrderValidator {
            line,
            context_id: context_id.into(),
        }
    }

    /// One error per rejected line, in line order. Empty means payable.
    pub async fn validate_order(&self, order: &Order) -> Vec<ValidationError> {
        let ctx = ValidationContext::payment(self.context_id.clone());

        let results: Vec<ValidationResult> = if self.line.policy().concurrent_order_checks {
            join_all(
                order
                    .lines
                    .iter()
                    .map(|line| self.line.validate_line(&line.product_id, line.quantity, &ctx)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(order.lines.len());
            for line in &order.lines {
                results.push(
                    self.line
                        .validate_line(&line.product_id, line.quantity, &ctx)
                        .await,
                );
            }
            results
        };

        let errors: Vec<ValidationError> = order
            .lines
            .iter()
            .zip(results)
            .filter(|(_, result)| !result.valid)
            .map(|(line, result)| to_error(line, result))
            .collect();

        if errors.is_empty() {
            debug!(order_id = %order.id, lines = order.lines.len(), "Order payable");
        } else {
            info!(order_id = %order.id, rejected = errors.len(), "Order blocked by kit stock");
        }
        errors
    }

    pub async fn verdict(&self, order: &Order) -> OrderVerdict {
        OrderVerdict::new(self.validate_order(order).await)
    }
}

fn to_error(line: &OrderLine, result: ValidationResult) -> ValidationError {
    ValidationError {
        product_name: line.product_name.clone(),
        requested_quantity: line.quantity,
        message: result.error.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::CatalogCache;
    use crate::line::ValidationPolicy;
    use crate::memory::InMemoryStore;
    use crate::quantity::Quantity;
    use crate::types::{Component, ProductId};

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_product("KITX", "Kit X", true)
            .add_product("KITY", "Kit Y", true)
            .add_product("PLAINY", "Plain Y", false)
            .set_bom("KITX", vec![Component::new("A", "A", Quantity::from_units(2))])
            .set_bom("KITY", vec![Component::new("B", "B", Quantity::from_units(1))])
            .set_stock("A", Quantity::from_units(1))
            .set_stock("B", Quantity::zero());
        store
    }

    fn validator(store: &InMemoryStore, concurrent: bool) -> OrderValidator {
        let policy = ValidationPolicy {
            concurrent_order_checks: concurrent,
            ..ValidationPolicy::default()
        };
        let line = LineValidator::new(
            Arc::new(CatalogCache::new()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            policy,
        );
        OrderValidator::new(line, "store-1")
    }

    fn order(lines: &[(&str, &str, i64)]) -> Order {
        let mut order = Order::new();
        for (id, name, units) in lines {
            order
                .add(&ProductId::new(*id), name, Quantity::from_units(*units))
                .unwrap();
        }
        order
    }

    #[tokio::test]
    async fn test_only_kit_errors_are_reported() {
        let store = store();
        let order = order(&[("KITX", "Kit X", 1), ("PLAINY", "Plain Y", 5)]);

        let errors = validator(&store, false).validate_order(&order).await;

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].product_name, "Kit X");
        assert_eq!(errors[0].requested_quantity, Quantity::from_units(1));
        assert_eq!(errors[0].message, "A: available=1, required=2");
    }

    #[tokio::test]
    async fn test_errors_follow_line_order() {
        for concurrent in [false, true] {
            let store = store();
            let order = order(&[
                ("KITY", "Kit Y", 1),
                ("PLAINY", "Plain Y", 5),
                ("KITX", "Kit X", 1),
            ]);

            let errors = validator(&store, concurrent).validate_order(&order).await;

            let names: Vec<_> = errors.iter().map(|e| e.product_name.as_str()).collect();
            assert_eq!(names, vec!["Kit Y", "Kit X"]);
        }
    }

    #[tokio::test]
    async fn test_payable_order() {
        let store = store();
        store.set_stock("A", Quantity::from_units(2));
        let order = order(&[("KITX", "Kit X", 1), ("PLAINY", "Plain Y", 5)]);

        let verdict = validator(&store, false).verdict(&order).await;

        assert!(verdict.is_payable());
        assert_eq!(verdict.summary(), None);
    }

    #[tokio::test]
    async fn test_empty_order_is_payable() {
        let store = store();
        let errors = validator(&store, false).validate_order(&Order::new()).await;
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_summary_lists_every_rejected_line() {
        let store = store();
        let order = order(&[("KITX", "Kit X", 1), ("KITY", "Kit Y", 2)]);

        let verdict = validator(&store, false).verdict(&order).await;

        assert_eq!(
            verdict.summary().unwrap(),
            "Kit stock validation failed:\n\
             Kit X (Qty: 1): A: available=1, required=2\n\
             Kit Y (Qty: 2): B: available=0, required=2"
        );
    }
}
