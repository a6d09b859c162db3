//! # Remote Validation Client
//!
//! `RemoteStockValidator` over HTTP, talking to the stock-api.
//!
//! ```text
//! POST {base}/api/v1/stock/validate
//!   { "productId": "GIFT-BOX", "quantity": "3", "contextId": "store-1" }
//!
//! 200 { "valid": false, "error": "Ribbon: available=5, required=6" }
//! ```
//!
//! Transport errors, non-2xx statuses and bodies that do not decode are all
//! errors; the line validator folds them into the generic rejection.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use kitguard_core::{
    ProductId, Quantity, RemoteStockValidator, SourceError, SourceResult, StockCheckRequest,
    ValidationResult,
};

use crate::error::{ConfigError, ConfigResult};

const VALIDATE_PATH: &str = "api/v1/stock/validate";

/// HTTP client for the remote validation endpoint.
#[derive(Debug, Clone)]
pub struct HttpStockValidator {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpStockValidator {
    /// Builds a client for `base_url` (e.g. `http://10.0.0.5:8080`).
    pub fn new(base_url: &str, timeout: Duration) -> ConfigResult<Self> {
        let mut base =
            Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(VALIDATE_PATH)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(HttpStockValidator { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteStockValidator for HttpStockValidator {
    async fn validate_stock(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        context_id: &str,
    ) -> SourceResult<ValidationResult> {
        let request = StockCheckRequest {
            product_id: product_id.clone(),
            quantity,
            context_id: context_id.to_string(),
        };

        debug!(endpoint = %self.endpoint, product_id = %product_id, %quantity, "Remote stock check");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Remote stock check failed");
                SourceError::unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Remote stock check rejected");
            return Err(SourceError::unavailable(format!(
                "validation endpoint returned {status}"
            )));
        }

        response
            .json::<ValidationResult>()
            .await
            .map_err(|e| SourceError::InvalidData(format!("undecodable validation response: {e}")))
    }
}
