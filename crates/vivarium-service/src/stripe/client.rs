//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{CheckoutSession, StripeErrorResponse};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },
}

/// Request timeout. Webhook processing is on the hot path of a delivery
/// attempt, so lookups are bounded tightly.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff before the single retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, Self::BASE_URL)
    }

    /// Create a client against a non-default API base (tests).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Retrieve a Checkout session with its line items expanded.
    ///
    /// Used when a `checkout.session.completed` event carries no
    /// `metadata.product_id`; the line items identify the product. Retries
    /// once on transport failure or 5xx. The webhook sender redelivers on
    /// non-2xx, so aggressive internal retry only risks duplicate work.
    pub async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let url = format!("{}/checkout/sessions/{}", self.base_url, session_id);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .get(&url)
                .basic_auth(&self.api_key, Option::<&str>::None)
                .query(&[("expand[]", "line_items")])
                .send()
                .await;

            let retryable = match &result {
                Ok(response) => response.status().is_server_error(),
                Err(err) => err.is_timeout() || err.is_connect(),
            };

            if retryable && attempt == 1 {
                tracing::warn!(session_id = %session_id, "Checkout session lookup failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
                continue;
            }

            return handle_response(result?).await;
        }
    }
}

/// Handle API response and convert errors.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let error_body: Result<StripeErrorResponse, _> = response.json().await;

    match error_body {
        Ok(stripe_error) => Err(StripeError::Api {
            error_type: stripe_error.error.error_type,
            message: stripe_error.error.message,
            code: stripe_error.error.code,
        }),
        Err(_) => Err(StripeError::Api {
            error_type: "unknown".to_string(),
            message: format!("HTTP {status}"),
            code: None,
        }),
    }
}
