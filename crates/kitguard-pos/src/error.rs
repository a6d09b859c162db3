//! # POS Error Type
//!
//! Unified error type for the session workflow.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kitguard POS                           │
//! │                                                                         │
//! │  Frontend                    PosSession                                 │
//! │  ────────                    ──────────                                 │
//! │                                                                         │
//! │  invoke('add_to_cart')                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  Result<T, PosError>                                             │   │
//! │  │         │                                                        │   │
//! │  │  Line rejected? ─── ValidationResult { valid: false } ──┐        │   │
//! │  │         │                                               │        │   │
//! │  │  Cart rule broken? ─── CoreError::OrderTooLarge ────── PosError ►│   │
//! │  │         │                                               │        │   │
//! │  │  Order moved on? ─── STALE_RESULT ──────────────────────┘        │   │
//! │  │         │                                                        │   │
//! │  │  Success ───────────────────────────────────────────────────────►│   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  catch (e) {                                                            │
//! │    // e.code    = "INSUFFICIENT_STOCK"                                  │
//! │    // e.message = "Ribbon: available=5, required=6"                     │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use kitguard_core::verdict::{format_shortages, ORDER_FAILURE_HEADING, VALIDATION_UNAVAILABLE_MESSAGE};
use kitguard_core::{BomFailure, CoreError, LedgerError, SourceError, ValidationError, ValidationResult};

use crate::cart::PaymentInProgress;

/// Error returned from session operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Kit stock validation failed:\nGift Box (Qty: 3): ..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PosError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Rejected order lines behind a payment refusal
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

/// Error codes for session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or order line not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Kit components are short
    InsufficientStock,

    /// Catalog, stock or remote check could not be completed
    ValidationUnavailable,

    /// The order changed while a check was in flight, or is being paid
    StaleResult,

    /// Cart rule broken (too many lines, empty order)
    CartError,

    /// Component consumption at payment failed
    PaymentError,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// Internal error
    Internal,
}

impl PosError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        PosError {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        PosError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::CartError, message)
    }

    /// The generic "try again" error.
    pub fn unavailable() -> Self {
        PosError::new(ErrorCode::ValidationUnavailable, VALIDATION_UNAVAILABLE_MESSAGE)
    }

    /// The order moved on while a check was running; the result was dropped.
    pub fn stale(what: &str) -> Self {
        PosError::new(
            ErrorCode::StaleResult,
            format!("Order changed while {} was being checked. Please try again.", what),
        )
    }

    /// Converts a rejected line verdict.
    pub fn from_rejection(result: &ValidationResult) -> Self {
        let code = if !result.shortages.is_empty() {
            ErrorCode::InsufficientStock
        } else if result.message() == VALIDATION_UNAVAILABLE_MESSAGE {
            ErrorCode::ValidationUnavailable
        } else {
            ErrorCode::ValidationError
        };
        PosError::new(code, result.message())
    }

    /// Converts a refused payment check.
    pub fn payment_refused(summary: String, errors: Vec<ValidationError>) -> Self {
        PosError {
            code: ErrorCode::InsufficientStock,
            message: summary,
            errors,
        }
    }
}

impl std::fmt::Display for PosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for PosError {}

/// Converts cart rule violations.
impl From<CoreError> for PosError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => PosError::not_found("Product", &id),
            CoreError::LineNotFound(id) => PosError::not_found("Order line", &id),
            CoreError::OrderTooLarge { .. } => PosError::cart(err.to_string()),
            CoreError::QuantityTooLarge { .. } => PosError::validation(err.to_string()),
            CoreError::Input(e) => PosError::validation(e.to_string()),
        }
    }
}

impl From<kitguard_core::InputError> for PosError {
    fn from(err: kitguard_core::InputError) -> Self {
        PosError::validation(err.to_string())
    }
}

/// Cart edits during a payment are stale by the time the payment lands.
impl From<PaymentInProgress> for PosError {
    fn from(_: PaymentInProgress) -> Self {
        PosError::new(
            ErrorCode::StaleResult,
            "Order is locked while payment is in progress.",
        )
    }
}

/// Converts failures from the debug helpers (refresh).
impl From<BomFailure> for PosError {
    fn from(failure: BomFailure) -> Self {
        match failure {
            BomFailure::MetadataUnresolved {
                product_id,
                source: SourceError::NotFound { .. },
            } => PosError::not_found("Product", product_id.as_str()),
            BomFailure::InsufficientStock(shortages) => {
                PosError::new(ErrorCode::InsufficientStock, format_shortages(&shortages))
            }
            BomFailure::InvalidQuantity(_) => {
                PosError::validation(kitguard_core::verdict::QUANTITY_NOT_POSITIVE_MESSAGE)
            }
            other => {
                tracing::warn!(error = %other, "Kit check unavailable");
                PosError::unavailable()
            }
        }
    }
}

/// Converts a refused component consumption.
impl From<LedgerError> for PosError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Insufficient(shortages) => PosError::new(
                ErrorCode::InsufficientStock,
                format!("{}\n{}", ORDER_FAILURE_HEADING, format_shortages(&shortages)),
            ),
            LedgerError::Source(e) => {
                tracing::error!(error = %e, "Component consumption failed");
                PosError::new(
                    ErrorCode::PaymentError,
                    "Failed to record kit components. Please try again.",
                )
            }
        }
    }
}

impl From<ConfigError> for PosError {
    fn from(err: ConfigError) -> Self {
        PosError::new(ErrorCode::ConfigError, err.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or saving [`ValidatorConfig`](crate::config::ValidatorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No config path available")]
    NoPath,

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for session operations.
pub type PosResult<T> = Result<T, PosError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kitguard_core::{ProductId, Quantity, Shortage};

    fn shortage() -> Shortage {
        Shortage {
            component_id: ProductId::new("A"),
            component_name: "Ribbon".to_string(),
            required: Quantity::from_units(6),
            available: Quantity::from_units(5),
        }
    }

    #[test]
    fn test_error_code_serialization() {
        let err = PosError::stale("the cart");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "STALE_RESULT");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_rejection_codes() {
        let short = PosError::from_rejection(&ValidationResult::short(vec![shortage()]));
        assert_eq!(short.code, ErrorCode::InsufficientStock);
        assert_eq!(short.message, "Ribbon: available=5, required=6");

        let unavailable = PosError::from_rejection(&ValidationResult::unavailable());
        assert_eq!(unavailable.code, ErrorCode::ValidationUnavailable);

        let rejected = PosError::from_rejection(&ValidationResult::rejected("Quantity must be positive"));
        assert_eq!(rejected.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_ledger_shortage_message() {
        let err: PosError = LedgerError::Insufficient(vec![shortage()]).into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Kit stock validation failed:\nRibbon: available=5, required=6"
        );
    }

    #[test]
    fn test_core_errors() {
        let err: PosError = CoreError::OrderTooLarge { max: 100 }.into();
        assert_eq!(err.code, ErrorCode::CartError);

        let err: PosError = CoreError::LineNotFound("L1".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
