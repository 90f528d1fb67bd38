//! PayPal REST client.
//!
//! The backend's role is deliberately thin: construct the Orders v2 request
//! (amount, currency, return/cancel URLs), relay PayPal's result, and
//! capture on confirmation. There is no local payment state machine beyond
//! the order's own status column.
//!
//! OAuth client-credentials tokens are cached in-process and refreshed
//! shortly before expiry.

mod error;
pub mod types;

pub use error::PayPalError;

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::PayPalConfig;
use types::{
    Amount, ApplicationContext, CaptureResponse, CreateOrderRequest, OrderIntent, OrderResponse,
    PurchaseUnit,
};

/// Refresh the cached token this many seconds before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth access token with its expiry timestamp.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: SecretString,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + TOKEN_EXPIRY_MARGIN_SECS < self.expires_at
    }
}

/// Response from the OAuth token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

/// Error response from the OAuth token endpoint.
#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// =============================================================================
// PayPalClient
// =============================================================================

/// Client for the PayPal Orders v2 REST API.
#[derive(Clone)]
pub struct PayPalClient {
    inner: Arc<PayPalClientInner>,
}

struct PayPalClientInner {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
    currency: String,
    token: RwLock<Option<CachedToken>>,
}

impl PayPalClient {
    /// Create a new PayPal client.
    #[must_use]
    pub fn new(config: &PayPalConfig) -> Self {
        Self {
            inner: Arc::new(PayPalClientInner {
                client: reqwest::Client::new(),
                base_url: config.environment.base_url().to_owned(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                currency: config.currency.code().to_owned(),
                token: RwLock::new(None),
            }),
        }
    }

    /// The checkout currency this client was configured with.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.inner.currency
    }

    /// Get a valid access token, fetching a new one when the cached token is
    /// absent or close to expiry.
    async fn access_token(&self) -> Result<SecretString, PayPalError> {
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = self.inner.token.read().await.as_ref()
            && token.is_fresh(now)
        {
            return Ok(token.access_token.clone());
        }

        let response = self
            .inner
            .client
            .post(format!("{}/v1/oauth2/token", self.inner.base_url))
            .basic_auth(
                &self.inner.client_id,
                Some(self.inner.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_response: TokenErrorResponse =
                response.json().await.unwrap_or(TokenErrorResponse {
                    error: None,
                    error_description: None,
                });

            let message = error_response
                .error_description
                .or(error_response.error)
                .unwrap_or_else(|| format!("HTTP {status}"));

            return Err(PayPalError::AuthenticationFailed(message));
        }

        let token_response: TokenResponse = response.json().await?;
        let token = CachedToken {
            access_token: SecretString::from(token_response.access_token),
            expires_at: now + token_response.expires_in,
        };

        let access_token = token.access_token.clone();
        *self.inner.token.write().await = Some(token);

        debug!("Fetched fresh PayPal access token");
        Ok(access_token)
    }

    /// Create a checkout order for an amount.
    ///
    /// # Errors
    ///
    /// Returns `PayPalError` when authentication or the API call fails.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        amount: Decimal,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<OrderResponse, PayPalError> {
        let request = CreateOrderRequest {
            intent: OrderIntent::Capture,
            purchase_units: vec![PurchaseUnit {
                amount: Amount {
                    currency_code: self.inner.currency.clone(),
                    value: format!("{amount:.2}"),
                },
                reference_id: None,
            }],
            application_context: Some(ApplicationContext {
                brand_name: Some("Telar".to_owned()),
                return_url: return_url.to_owned(),
                cancel_url: cancel_url.to_owned(),
                user_action: "PAY_NOW".to_owned(),
            }),
        };

        let token = self.access_token().await?;

        let response = self
            .inner
            .client
            .post(format!("{}/v2/checkout/orders", self.inner.base_url))
            .bearer_auth(token.expose_secret())
            // Idempotency key: a retried request returns the same order
            .header("PayPal-Request-Id", uuid::Uuid::new_v4().to_string())
            .json(&request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Capture an approved order.
    ///
    /// # Errors
    ///
    /// Returns `PayPalError` when authentication or the API call fails.
    #[instrument(skip(self))]
    pub async fn capture_order(&self, order_id: &str) -> Result<CaptureResponse, PayPalError> {
        let token = self.access_token().await?;

        let response = self
            .inner
            .client
            .post(format!(
                "{}/v2/checkout/orders/{order_id}/capture",
                self.inner.base_url
            ))
            .bearer_auth(token.expose_secret())
            .header("Content-Type", "application/json")
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Decode a JSON response or surface the API error body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PayPalError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PayPalError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| PayPalError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_token_freshness() {
        let token = CachedToken {
            access_token: SecretString::from("token"),
            expires_at: 1_000,
        };

        // Well before expiry
        assert!(token.is_fresh(0));
        // Inside the refresh margin
        assert!(!token.is_fresh(1_000 - TOKEN_EXPIRY_MARGIN_SECS));
        // Past expiry
        assert!(!token.is_fresh(2_000));
    }
}
