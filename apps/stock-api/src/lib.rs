//! # Kitguard Stock API
//!
//! HTTP endpoint that registers in remote validation mode call instead of
//! reading stock themselves.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Stock API Routes                               │
//! │                                                                         │
//! │  POST /api/v1/stock/validate                                            │
//! │    { productId, quantity, contextId }                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    LineValidator (Local mode, purpose AddToCart, fresh catalog cache)   │
//! │         │                                                               │
//! │         ├── 200 { "valid": true }                                       │
//! │         ├── 200 { "valid": false, "error": "Ribbon: available=..." }    │
//! │         └── 400 { "code": "VALIDATION_ERROR", "message": ... }          │
//! │                                                                         │
//! │  GET /health                                                            │
//! │    200 { "status": "ok", "database": true }                             │
//! │    503 { "status": "degraded", "database": false }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `STOCK_API_ADDR` - Listen address (default: 0.0.0.0:8080)
//! - `STOCK_API_DB_PATH` - SQLite database file (default: kitguard.db)
//! - `RUST_LOG` - Log filter (default: info,kitguard=debug,sqlx=warn)

pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use kitguard_core::validation::{validate_context_id, validate_product_id};
use kitguard_core::{
    CatalogCache, LineValidator, StockCheckRequest, ValidationContext, ValidationPolicy,
    ValidationResult,
};
use kitguard_db::{Database, SqliteSources};

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Path of the validation endpoint, relative to the server root.
pub const VALIDATE_ROUTE: &str = "/api/v1/stock/validate";

/// Shared application state.
pub struct AppState {
    pub db: Database,
    sources: Arc<SqliteSources>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let sources = Arc::new(db.sources());
        AppState { db, sources }
    }

    /// A line validator over the database.
    ///
    /// Each request gets its own catalog cache, so BOM and flag edits are
    /// visible to the next check.
    fn validator(&self) -> LineValidator {
        LineValidator::new(
            Arc::new(CatalogCache::new()),
            self.sources.clone(),
            self.sources.clone(),
            ValidationPolicy::default(),
        )
    }
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(VALIDATE_ROUTE, post(validate_handler))
        .route("/health", get(health_handler))
        .with_state(Arc::new(state))
}

// =============================================================================
// Handlers
// =============================================================================

/// Kit stock check for one product and quantity.
async fn validate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StockCheckRequest>, JsonRejection>,
) -> ApiResult<Json<ValidationResult>> {
    let Json(request) = payload?;
    validate_product_id(request.product_id.as_str())?;
    validate_context_id(&request.context_id)?;

    let ctx = ValidationContext::add_to_cart(request.context_id.clone());
    let result = state
        .validator()
        .validate_line(&request.product_id, request.quantity, &ctx)
        .await;

    info!(
        product_id = %request.product_id,
        quantity = %request.quantity,
        context_id = %request.context_id,
        valid = result.valid,
        "Remote stock check"
    );

    Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

/// Health check endpoint.
async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use kitguard_core::{Component, Quantity};
    use kitguard_db::DbConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn database() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert("KIT", "Gift Box", true).await.unwrap();
        db.products().insert("A", "Ribbon", false).await.unwrap();
        db.products().insert("WATER", "Water", false).await.unwrap();
        db.boms()
            .replace_components("KIT", &[Component::new("A", "", Quantity::from_units(2))])
            .await
            .unwrap();
        db.stock()
            .set_available("A", Quantity::from_units(5))
            .await
            .unwrap();
        db
    }

    async fn post_json(app: Router, body: Body) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(VALIDATE_ROUTE)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn check(app: Router, product: &str, quantity: &str) -> (StatusCode, Value) {
        let body = json!({ "productId": product, "quantity": quantity, "contextId": "store-1" });
        post_json(app, Body::from(body.to_string())).await
    }

    #[tokio::test]
    async fn test_validate_within_stock() {
        let app = router(AppState::new(database().await));

        let (status, body) = check(app, "KIT", "2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "valid": true }));
    }

    #[tokio::test]
    async fn test_validate_short_kit() {
        let app = router(AppState::new(database().await));

        let (status, body) = check(app, "KIT", "3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["error"], "Ribbon: available=5, required=6");
    }

    #[tokio::test]
    async fn test_unknown_product_fails_closed() {
        let app = router(AppState::new(database().await));

        let (status, body) = check(app, "NOPE", "1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["error"], "Failed to validate kit stock. Please try again.");
    }

    #[tokio::test]
    async fn test_bom_edits_are_seen_immediately() {
        let db = database().await;
        let app = router(AppState::new(db.clone()));

        let (_, body) = check(app.clone(), "KIT", "3").await;
        assert_eq!(body["valid"], false);

        db.boms()
            .replace_components("KIT", &[Component::new("A", "", Quantity::from_units(1))])
            .await
            .unwrap();
        let (_, body) = check(app, "KIT", "3").await;
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = router(AppState::new(database().await));

        let (status, body) = post_json(app.clone(), Body::from("{\"productId\": ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = check(app, "  ", "1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "product_id is required");
    }

    #[tokio::test]
    async fn test_health() {
        let db = database().await;
        let app = router(AppState::new(db.clone()));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "status": "ok", "database": true }));

        db.close().await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
