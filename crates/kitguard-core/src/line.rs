//! # Line Validator
//!
//! The unit invoked on every add-to-cart attempt: one product, one
//! quantity, one verdict.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_line(product, qty, ctx)                                       │
//! │     │                                                                   │
//! │     ├─ policy.enabled == false ──────────────────────────► valid        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  CatalogCache::resolve_kind ──Err──► MetadataUnresolved                 │
//! │     │                                                                   │
//! │     ├─ PlainItem ────────────────────────────────────────► valid        │
//! │     │                                                                   │
//! │     ├─ qty <= 0 ─────────────────────► "Quantity must be positive"      │
//! │     │                                                                   │
//! │     ├─ mode Remote ──► RemoteStockValidator ──Err──► RemoteEndpointError│
//! │     │                                                                   │
//! │     ▼ mode Local                                                        │
//! │  BomExpander::expand ──Err──► ExpansionUnavailable                      │
//! │     │                                                                   │
//! │  ShortageEvaluator::evaluate ──Err──► StockUnavailable                  │
//! │     │                                                                   │
//! │     ├─ shortages ────────────────────► InsufficientStock (itemized)     │
//! │     └─ none ─────────────────────────────────────────────► valid        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `BomFailure` is folded into a [`ValidationResult`] here; nothing
//! escapes as an error.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::bom::{BomExpander, Expansion};
use crate::cache::CatalogCache;
use crate::error::BomFailure;
use crate::ports::{CatalogSource, RemoteStockValidator, StockSource};
use crate::quantity::Quantity;
use crate::shortage::ShortageEvaluator;
use crate::types::{ProductId, ProductKind};
use crate::verdict::{ValidationResult, QUANTITY_NOT_POSITIVE_MESSAGE};

// =============================================================================
// Context
// =============================================================================

/// Why a line is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CheckPurpose {
    /// Cashier adds or changes a line.
    AddToCart,
    /// Pre-payment gate.
    Payment,
    /// Debug helpers; may fail open on metadata errors.
    Diagnostic,
}

/// Per-call context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationContext {
    /// Store/register configuration id forwarded to the remote endpoint.
    pub context_id: String,
    pub purpose: CheckPurpose,
}

impl ValidationContext {
    pub fn new(context_id: impl Into<String>, purpose: CheckPurpose) -> Self {
        ValidationContext {
            context_id: context_id.into(),
            purpose,
        }
    }

    pub fn add_to_cart(context_id: impl Into<String>) -> Self {
        Self::new(context_id, CheckPurpose::AddToCart)
    }

    pub fn payment(context_id: impl Into<String>) -> Self {
        Self::new(context_id, CheckPurpose::Payment)
    }

    pub fn diagnostic(context_id: impl Into<String>) -> Self {
        Self::new(context_id, CheckPurpose::Diagnostic)
    }
}

// =============================================================================
// Policy
// =============================================================================

/// What to do when kit flags cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPolicy {
    /// Treat the product as plain and allow.
    FailOpen,
    /// Block with the generic message.
    #[default]
    FailClosed,
}

impl FromStr for MetadataPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(MetadataPolicy::FailOpen),
            "fail_closed" | "closed" => Ok(MetadataPolicy::FailClosed),
            other => Err(format!("unknown metadata policy: {other}")),
        }
    }
}

/// Where the stock decision is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Expander + Evaluator in process.
    #[default]
    Local,
    /// Delegate kits to the remote validation endpoint.
    Remote,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ValidationMode::Local),
            "remote" => Ok(ValidationMode::Remote),
            other => Err(format!("unknown validation mode: {other}")),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Local => f.write_str("local"),
            ValidationMode::Remote => f.write_str("remote"),
        }
    }
}

/// Store-level validation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationPolicy {
    /// Master switch; when off every line is valid.
    pub enabled: bool,
    pub mode: ValidationMode,
    /// Applies to `CheckPurpose::Diagnostic` only.
    pub diagnostic_metadata_policy: MetadataPolicy,
    /// Validate order lines concurrently (results keep line order).
    pub concurrent_order_checks: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            enabled: true,
            mode: ValidationMode::Local,
            diagnostic_metadata_policy: MetadataPolicy::FailClosed,
            concurrent_order_checks: false,
        }
    }
}

impl ValidationPolicy {
    /// Metadata policy for a given purpose. Cart and payment never fail open.
    pub fn metadata_policy(&self, purpose: CheckPurpose) -> MetadataPolicy {
        match purpose {
            CheckPurpose::AddToCart | CheckPurpose::Payment => MetadataPolicy::FailClosed,
            CheckPurpose::Diagnostic => self.diagnostic_metadata_policy,
        }
    }
}

// =============================================================================
// Line Validator
// =============================================================================

/// Orchestrates cache, expander and evaluator for one line.
#[derive(Clone)]
pub struct LineValidator {
    cache: Arc<CatalogCache>,
    catalog: Arc<dyn CatalogSource>,
    expander: BomExpander,
    evaluator: ShortageEvaluator,
    remote: Option<Arc<dyn RemoteStockValidator>>,
    policy: ValidationPolicy,
}

impl LineValidator {
    pub fn new(
        cache: Arc<CatalogCache>,
        catalog: Arc<dyn CatalogSource>,
        stock: Arc<dyn StockSource>,
        policy: ValidationPolicy,
    ) -> Self {
        LineValidator {
            expander: BomExpander::new(cache.clone(), catalog.clone()),
            evaluator: ShortageEvaluator::new(stock),
            cache,
            catalog,
            remote: None,
            policy,
        }
    }

    /// Attaches the client used in [`ValidationMode::Remote`].
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStockValidator>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Checks one (product, quantity) pair. Never fails.
    pub async fn validate_line(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        if !self.policy.enabled {
            return ValidationResult::ok();
        }

        match self.check(product_id, quantity, ctx).await {
            Ok(result) => {
                if result.valid {
                    debug!(product_id = %product_id, %quantity, "Line accepted");
                } else {
                    info!(product_id = %product_id, %quantity, "Line rejected by remote validator");
                }
                result
            }
            Err(failure) => self.fold(product_id, quantity, ctx, failure),
        }
    }

    async fn check(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        ctx: &ValidationContext,
    ) -> Result<ValidationResult, BomFailure> {
        let kind = self
            .cache
            .resolve_kind(product_id, self.catalog.as_ref())
            .await?;

        if kind == ProductKind::PlainItem {
            return Ok(ValidationResult::ok());
        }

        if !quantity.is_positive() {
            return Err(BomFailure::InvalidQuantity(quantity.to_string()));
        }

        if self.policy.mode == ValidationMode::Remote {
            return self.check_remote(product_id, quantity, ctx).await;
        }

        let components = match self.expander.expand(&kind).await? {
            Expansion::NotAKit => return Ok(ValidationResult::ok()),
            Expansion::Components(components) => components,
        };

        let shortages = self.evaluator.evaluate(&components, quantity).await?;
        if shortages.is_empty() {
            Ok(ValidationResult::ok())
        } else {
            Err(BomFailure::InsufficientStock(shortages))
        }
    }

    async fn check_remote(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        ctx: &ValidationContext,
    ) -> Result<ValidationResult, BomFailure> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            BomFailure::RemoteEndpointError(crate::error::SourceError::unavailable(
                "remote mode without a configured endpoint",
            ))
        })?;

        let mut result = remote
            .validate_stock(product_id, quantity, &ctx.context_id)
            .await
            .map_err(BomFailure::RemoteEndpointError)?;

        // A bare rejection still needs something to show
        if !result.valid && result.error.is_none() {
            result = ValidationResult::unavailable();
        }
        Ok(result)
    }

    /// Maps a failure to its verdict.
    fn fold(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        ctx: &ValidationContext,
        failure: BomFailure,
    ) -> ValidationResult {
        if matches!(failure, BomFailure::MetadataUnresolved { .. })
            && self.policy.metadata_policy(ctx.purpose) == MetadataPolicy::FailOpen
        {
            warn!(
                product_id = %product_id,
                error = %failure,
                purpose = ?ctx.purpose,
                "Kit flags unresolved, failing open"
            );
            return ValidationResult::ok();
        }

        match failure {
            BomFailure::InsufficientStock(shortages) => {
                info!(
                    product_id = %product_id,
                    %quantity,
                    shortages = shortages.len(),
                    "Kit line rejected"
                );
                ValidationResult::short(shortages)
            }
            BomFailure::InvalidQuantity(_) => {
                info!(product_id = %product_id, %quantity, "Non-positive kit quantity");
                ValidationResult::rejected(QUANTITY_NOT_POSITIVE_MESSAGE)
            }
            other => {
                warn!(
                    product_id = %product_id,
                    error = %other,
                    purpose = ?ctx.purpose,
                    "Kit stock validation unavailable"
                );
                ValidationResult::unavailable()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
