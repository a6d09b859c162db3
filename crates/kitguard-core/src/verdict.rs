//! # Verdicts
//!
//! What the validators hand back to the presentation layer.
//!
//! ## Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Line check  ──► ValidationResult { valid, error? }                     │
//! │                                                                         │
//! │  Order check ──► Vec<ValidationError { product_name, quantity, msg }>   │
//! │                    │                                                    │
//! │                    └─► OrderVerdict::summary()                          │
//! │                          "Kit stock validation failed:                  │
//! │                           Gift Box (Qty: 3): Ribbon: available=5, ..."  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every verdict type derives `TS` so the frontend renders the exact same
//! shapes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::quantity::Quantity;
use crate::types::ProductId;

/// Message used for every infrastructural failure.
pub const VALIDATION_UNAVAILABLE_MESSAGE: &str = "Failed to validate kit stock. Please try again.";

/// Message for a non-positive kit quantity.
pub const QUANTITY_NOT_POSITIVE_MESSAGE: &str = "Quantity must be positive";

/// Heading of the pre-payment summary.
pub const ORDER_FAILURE_HEADING: &str = "Kit stock validation failed:";

// =============================================================================
// Shortage
// =============================================================================

/// A component whose available stock is below what the kit line needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shortage {
    pub component_id: ProductId,
    pub component_name: String,
    #[ts(as = "String")]
    pub required: Quantity,
    #[ts(as = "String")]
    pub available: Quantity,
}

impl Shortage {
    /// `"<componentName>: available=<available>, required=<required>"`
    pub fn describe(&self) -> String {
        format!(
            "{}: available={}, required={}",
            self.component_name, self.available, self.required
        )
    }
}

/// Joins shortages into the multi-line line-rejection message.
pub fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(Shortage::describe)
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Validation Result (one line)
// =============================================================================

/// Verdict of a single line check.
///
/// Serializes as `{ "valid": true }` or `{ "valid": false, "error": "..." }`,
/// the shape the remote validation endpoint also answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationResult {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,

    /// Itemized shortages behind a rejection, when there were any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortages: Vec<Shortage>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        ValidationResult {
            valid: true,
            error: None,
            shortages: Vec::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ValidationResult {
            valid: false,
            error: Some(message.into()),
            shortages: Vec::new(),
        }
    }

    /// Rejection with the itemized shortage message.
    pub fn short(shortages: Vec<Shortage>) -> Self {
        ValidationResult {
            valid: false,
            error: Some(format_shortages(&shortages)),
            shortages,
        }
    }

    /// The generic "validation unavailable" rejection.
    pub fn unavailable() -> Self {
        Self::rejected(VALIDATION_UNAVAILABLE_MESSAGE)
    }

    /// Rejection message, empty for an accepted line.
    pub fn message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

/// Body of a remote line check: `{ "productId", "quantity", "contextId" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckRequest {
    pub product_id: ProductId,
    #[ts(as = "String")]
    pub quantity: Quantity,
    pub context_id: String,
}

// =============================================================================
// Validation Error (order level)
// =============================================================================

/// One rejected line of an order check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationError {
    pub product_name: String,
    #[ts(as = "String")]
    pub requested_quantity: Quantity,
    pub message: String,
}

impl ValidationError {
    /// `"<productName> (Qty: <quantity>): <message>"`
    pub fn describe(&self) -> String {
        format!(
            "{} (Qty: {}): {}",
            self.product_name, self.requested_quantity, self.message
        )
    }
}

// =============================================================================
// Order Verdict
// =============================================================================

/// Outcome of the pre-payment order check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderVerdict {
    pub errors: Vec<ValidationError>,
}

impl OrderVerdict {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        OrderVerdict { errors }
    }

    /// An order is payable when no line was rejected.
    pub fn is_payable(&self) -> bool {
        self.errors.is_empty()
    }

    /// Pre-payment message; `None` when payable.
    pub fn summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }

        let mut text = String::from(ORDER_FAILURE_HEADING);
        for error in &self.errors {
            text.push('\n');
            text.push_str(&error.describe());
        }
        Some(text)
    }
}

impl From<Vec<ValidationError>> for OrderVerdict {
    fn from(errors: Vec<ValidationError>) -> Self {
        OrderVerdict::new(errors)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shortage(name: &str, available: i64, required: i64) -> Shortage {
        Shortage {
            component_id: ProductId::new(name),
            component_name: name.to_string(),
            required: Quantity::from_units(required),
            available: Quantity::from_units(available),
        }
    }

    #[test]
    fn test_shortage_line_format() {
        assert_eq!(shortage("A", 5, 6).describe(), "A: available=5, required=6");

        let fractional = Shortage {
            required: Quantity::from_milli(2500),
            available: Quantity::from_milli(1250),
            ..shortage("Ribbon", 0, 0)
        };
        assert_eq!(
            fractional.describe(),
            "Ribbon: available=1.25, required=2.5"
        );
    }

    #[test]
    fn test_short_result_lists_one_shortage_per_line() {
        let result = ValidationResult::short(vec![shortage("A", 5, 6), shortage("B", 0, 1)]);
        assert!(!result.valid);
        assert_eq!(
            result.message(),
            "A: available=5, required=6\nB: available=0, required=1"
        );
        assert_eq!(result.shortages.len(), 2);
    }

    #[test]
    fn test_result_wire_shape() {
        let ok = serde_json::to_value(ValidationResult::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({ "valid": true }));

        let rejected = serde_json::to_value(ValidationResult::unavailable()).unwrap();
        assert_eq!(
            rejected,
            serde_json::json!({
                "valid": false,
                "error": "Failed to validate kit stock. Please try again."
            })
        );

        let parsed: ValidationResult =
            serde_json::from_str(r#"{"valid":false,"error":"nope"}"#).unwrap();
        assert_eq!(parsed, ValidationResult::rejected("nope"));
    }

    #[test]
    fn test_request_wire_shape() {
        let request: StockCheckRequest = serde_json::from_str(
            r#"{"productId":"KIT","quantity":"2.5","contextId":"store-1"}"#,
        )
        .unwrap();
        assert_eq!(request.product_id.as_str(), "KIT");
        assert_eq!(request.quantity, Quantity::from_milli(2_500));

        let whole: StockCheckRequest =
            serde_json::from_str(r#"{"productId":"KIT","quantity":3,"contextId":"store-1"}"#)
                .unwrap();
        assert_eq!(whole.quantity, Quantity::from_units(3));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["quantity"], "2.5");
        assert_eq!(json["contextId"], "store-1");
    }

    #[test]
    fn test_order_summary() {
        assert_eq!(OrderVerdict::default().summary(), None);

        let verdict = OrderVerdict::new(vec![ValidationError {
            product_name: "Gift Box".to_string(),
            requested_quantity: Quantity::from_units(3),
            message: "A: available=5, required=6".to_string(),
        }]);

        assert!(!verdict.is_payable());
        assert_eq!(
            verdict.summary().unwrap(),
            "Kit stock validation failed:\nGift Box (Qty: 3): A: available=5, required=6"
        );
    }
}
