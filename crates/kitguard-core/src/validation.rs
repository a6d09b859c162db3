//! # Validation Module
//!
//! Input and catalog-data validation utilities for Kitguard.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller input (cart command, HTTP body)                        │
//! │  ├── Ids present, quantities parseable and in range                     │
//! │  └── THIS MODULE: validate_product_id, validate_quantity, ...           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog data (BOM read from a source)                         │
//! │  ├── Component ids present, unit quantities positive                    │
//! │  └── THIS MODULE: validate_components (no self-reference)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Stock rules (bom, shortage, line, order modules)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kitguard_core::quantity::Quantity;
//! use kitguard_core::validation::{validate_product_id, validate_quantity};
//!
//! validate_product_id("GIFT-BOX").unwrap();
//! validate_quantity(Quantity::from_units(5)).unwrap();
//! ```

use crate::error::InputError;
use crate::quantity::Quantity;
use crate::types::{Component, ProductId};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type InputResult<T> = Result<T, InputError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product id.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
///
/// ## Example
/// ```rust
/// use kitguard_core::validation::validate_product_id;
///
/// assert!(validate_product_id("KIT-001").is_ok());
/// assert!(validate_product_id("  ").is_err());
/// ```
pub fn validate_product_id(id: &str) -> InputResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(InputError::Required {
            field: "product_id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(InputError::TooLong {
            field: "product_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_product_name(name: &str) -> InputResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(InputError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(InputError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a store/register context id forwarded to the remote endpoint.
///
/// Empty is allowed (no context); at most 100 characters.
pub fn validate_context_id(context_id: &str) -> InputResult<()> {
    if context_id.len() > 100 {
        return Err(InputError::TooLong {
            field: "context_id".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"                │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 0 and 999"      │
/// │       │                                                                 │
/// │       └── OK → kit stock check → add_to_cart                            │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: Quantity) -> InputResult<()> {
    if !qty.is_positive() {
        return Err(InputError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(InputError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of lines).
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_lines: usize) -> InputResult<()> {
    if current_lines >= MAX_CART_ITEMS {
        return Err(InputError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Sanity-checks a kit's component list as read from a catalog source.
///
/// ## Rules
/// - Every component id is non-empty
/// - Every unit quantity is strictly positive
/// - No component is the kit itself
///
/// An empty list is valid.
pub fn validate_components(kit_id: &ProductId, components: &[Component]) -> InputResult<()> {
    for component in components {
        if component.product_id.as_str().trim().is_empty() {
            return Err(InputError::Required {
                field: "component product_id".to_string(),
            });
        }

        if !component.unit_quantity.is_positive() {
            return Err(InputError::MustBePositive {
                field: format!("unit quantity of {}", component.product_id),
            });
        }

        if &component.product_id == kit_id {
            return Err(InputError::SelfReference {
                kit_id: kit_id.to_string(),
            });
        }
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
    fn test_validate_product_id() {
        assert!(validate_product_id("KIT-001").is_ok());
        assert!(validate_product_id("42").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Gift Box").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Quantity::from_units(1)).is_ok());
        assert!(validate_quantity(Quantity::from_milli(500)).is_ok());
        assert!(validate_quantity(Quantity::from_units(999)).is_ok());

        assert!(validate_quantity(Quantity::zero()).is_err());
        assert!(validate_quantity(Quantity::from_units(-1)).is_err());
        assert!(validate_quantity(Quantity::from_units(1000)).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(99).is_ok());
        assert!(validate_cart_size(100).is_err());
    }

    #[test]
    fn test_validate_components() {
        let kit = ProductId::new("KIT");
        let good = vec![Component::new("A", "Ribbon", Quantity::from_units(2))];
        assert!(validate_components(&kit, &good).is_ok());
        assert!(validate_components(&kit, &[]).is_ok());

        let zero = vec![Component::new("A", "Ribbon", Quantity::zero())];
        assert!(matches!(
            validate_components(&kit, &zero),
            Err(InputError::MustBePositive { .. })
        ));

        let blank = vec![Component::new("", "Nameless", Quantity::from_units(1))];
        assert!(matches!(
            validate_components(&kit, &blank),
            Err(InputError::Required { .. })
        ));

        let itself = vec![Component::new("KIT", "Gift Box", Quantity::from_units(1))];
        assert!(matches!(
            validate_components(&kit, &itself),
            Err(InputError::SelfReference { .. })
        ));
    }
}
