//! Shippo REST client for rate quotes and label purchase.
//!
//! # API Reference
//!
//! - Base URL: `SHIPPO_BASE_URL` (default `https://api.goshippo.com/`)
//! - Authentication: `Authorization` header, sent exactly as configured
//!   (e.g. `ShippoToken shippo_live_...`)
//! - `POST shipments/` - create a shipment and quote all carrier rates
//! - `POST transactions/` - buy a label for a quoted rate
//!
//! Both calls are made in synchronous mode (`"async": false`), so the
//! response already carries the rates or the label. Nothing is retried or
//! cached; timeouts are the transport defaults.

mod types;

pub use types::*;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::ShippoConfig;

/// Errors that can occur when calling the Shippo API.
#[derive(Debug, Error)]
pub enum ShippoError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Unauthorized (invalid or missing token).
    #[error("Unauthorized: invalid API token")]
    Unauthorized,

    /// Failed to parse a response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Carrier-rate provider operations used by the shipment workflow.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Create a shipment and quote every available carrier rate for it.
    async fn quote_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, ShippoError>;

    /// Buy a label for a previously quoted rate.
    async fn purchase_label(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, ShippoError>;
}

/// Shippo API client.
#[derive(Clone)]
pub struct ShippoClient {
    inner: Arc<ShippoClientInner>,
}

struct ShippoClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl ShippoClient {
    /// Create a new Shippo API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ShippoConfig) -> Result<Self, ShippoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(config.token.expose_secret())
                .map_err(|e| ShippoError::Parse(format!("Invalid token format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShippoClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// Base URL requests are sent to (without trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a POST request against the Shippo API.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ShippoError> {
        let url = format!("{}/{path}", self.inner.base_url);
        let response = self.inner.client.post(&url).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ShippoError::Parse(format!("Failed to parse response: {e}")));
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ShippoError::Unauthorized);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(ShippoError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RateProvider for ShippoClient {
    #[instrument(skip(self, request), fields(parcels = request.parcels.len()))]
    async fn quote_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, ShippoError> {
        let shipment: Shipment = self.post("shipments/", request).await?;

        tracing::debug!(
            shipment_id = ?shipment.object_id,
            status = %shipment.status,
            rates = shipment.rates.len(),
            "Shipment quoted"
        );
        Ok(shipment)
    }

    #[instrument(skip(self, request), fields(rate_id = %request.rate))]
    async fn purchase_label(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, ShippoError> {
        let transaction: Transaction = self.post("transactions/", request).await?;

        tracing::debug!(
            transaction_id = ?transaction.object_id,
            status = %transaction.status,
            "Label transaction completed"
        );
        Ok(transaction)
    }
}

impl std::fmt::Debug for ShippoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippoClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(base_url: &str) -> ShippoConfig {
        ShippoConfig {
            base_url: base_url.to_owned(),
            token: SecretString::from("ShippoToken shippo_test_9f8Kq2Lx7Vb"),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ShippoClient::new(&config("https://api.goshippo.com/")).unwrap();
        assert_eq!(client.base_url(), "https://api.goshippo.com");
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let mut cfg = config("https://api.goshippo.com/");
        cfg.token = SecretString::from("bad\ntoken");
        assert!(matches!(
            ShippoClient::new(&cfg),
            Err(ShippoError::Parse(_))
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ShippoClient::new(&config("https://api.goshippo.com/")).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("api.goshippo.com"));
        assert!(!debug.contains("shippo_test"));
    }
}
