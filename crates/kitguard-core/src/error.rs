//! # Error Types
//!
//! Domain-specific error types for kitguard-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kitguard-core errors (this file)                                       │
//! │  ├── BomFailure   - Why a kit check could not say "yes"                 │
//! │  ├── SourceError  - A port (catalog/stock/remote) failed                │
//! │  ├── CoreError    - General domain errors                               │
//! │  └── InputError   - Input validation failures                           │
//! │                                                                         │
//! │  kitguard-db errors (separate crate)                                    │
//! │  └── DbError      - Database operation failures                         │
//! │                                                                         │
//! │  kitguard-pos errors                                                    │
//! │  └── PosError     - What the cart UI sees (serialized)                  │
//! │                                                                         │
//! │  Flow: SourceError → BomFailure → ValidationResult → PosError → UI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `BomFailure` never escapes the Line Validator: every variant is folded
//! into a `ValidationResult`. It exists so each failure path is named and
//! mapped to exactly one policy.

use thiserror::Error;

use crate::types::ProductId;
use crate::verdict::Shortage;

// =============================================================================
// Source Error
// =============================================================================

/// A data-source port failed for infrastructural reasons.
///
/// ## When This Occurs
/// - Database unavailable / query failed
/// - Remote endpoint unreachable, timed out, or answered garbage
/// - The requested record does not exist in the source
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid data from source: {0}")]
    InvalidData(String),
}

impl SourceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        SourceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        SourceError::Unavailable(message.into())
    }
}

// =============================================================================
// BOM Failure Taxonomy
// =============================================================================

/// Failure taxonomy of a kit stock check.
///
/// "Not a kit" is deliberately absent: it is a control signal carried by
/// [`crate::bom::Expansion::NotAKit`], not an error.
///
/// ## Policy Table
/// ```text
/// ┌──────────────────────┬───────────────────────────────────────────────┐
/// │ Variant              │ Verdict                                       │
/// ├──────────────────────┼───────────────────────────────────────────────┤
/// │ MetadataUnresolved   │ closed (cart, payment); configurable (debug)  │
/// │ ExpansionUnavailable │ closed, generic message                       │
/// │ StockUnavailable     │ closed, generic message                       │
/// │ InsufficientStock    │ closed, itemized shortages                    │
/// │ RemoteEndpointError  │ closed, generic message                       │
/// │ InvalidQuantity      │ closed, input message                         │
/// └──────────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BomFailure {
    /// Kit flags could not be determined.
    #[error("kit metadata unresolved for {product_id}: {source}")]
    MetadataUnresolved {
        product_id: ProductId,
        source: SourceError,
    },

    /// The component list of a confirmed kit could not be fetched.
    #[error("component list unavailable for {product_id}: {reason}")]
    ExpansionUnavailable { product_id: ProductId, reason: String },

    /// A component's stock level could not be read.
    #[error("stock unavailable for component {component_id}: {source}")]
    StockUnavailable {
        component_id: ProductId,
        source: SourceError,
    },

    /// One or more components are short.
    #[error("insufficient stock for {} component(s)", .0.len())]
    InsufficientStock(Vec<Shortage>),

    /// The remote validation endpoint errored.
    #[error("remote stock validation failed: {0}")]
    RemoteEndpointError(SourceError),

    /// The requested kit quantity is not usable.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl BomFailure {
    /// True for failures caused by unreachable or broken data sources.
    pub fn is_infrastructural(&self) -> bool {
        matches!(
            self,
            BomFailure::MetadataUnresolved { .. }
                | BomFailure::ExpansionUnavailable { .. }
                | BomFailure::StockUnavailable { .. }
                | BomFailure::RemoteEndpointError(_)
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in the cart model.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order line cannot be found (removed meanwhile).
    #[error("Order line not found: {0}")]
    LineNotFound(String),

    /// Order has exceeded maximum allowed lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: String, max: i64 },

    /// Input error (wraps InputError).
    #[error("Validation error: {0}")]
    Input(#[from] InputError),
}

// =============================================================================
// Input Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input or catalog data doesn't meet
/// requirements. Used for early validation before business logic runs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., unparsable quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A kit lists itself as one of its components.
    #[error("kit {kit_id} lists itself as a component")]
    SelfReference { kit_id: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for port calls.
pub type SourceResult<T> = Result<T, SourceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: "1000".to_string(),
            max: 999,
        };
        assert_eq!(
            err.to_string(),
            "Quantity 1000 exceeds maximum allowed (999)"
        );
    }

    #[test]
    fn test_input_error_messages() {
        let err = InputError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");

        let err = InputError::SelfReference {
            kit_id: "KIT-1".to_string(),
        };
        assert_eq!(err.to_string(), "kit KIT-1 lists itself as a component");
    }

    #[test]
    fn test_input_converts_to_core_error() {
        let input_err = InputError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = input_err.into();
        assert!(matches!(core_err, CoreError::Input(_)));
    }

    #[test]
    fn test_infrastructural_classification() {
        let unresolved = BomFailure::MetadataUnresolved {
            product_id: ProductId::new("KIT-1"),
            source: SourceError::unavailable("timeout"),
        };
        assert!(unresolved.is_infrastructural());
        assert!(!BomFailure::InsufficientStock(Vec::new()).is_infrastructural());
        assert!(!BomFailure::InvalidQuantity("0".into()).is_infrastructural());
    }
}
