//! Provider webhook handlers: catalog sync and checkout fulfillment.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use vivarium_core::PurchaseAssignment;

use crate::crypto::verify_provider_signature;
use crate::error::ApiError;
use crate::events::{PricePayload, ProductPayload, ProviderEvent};
use crate::fulfillment::FulfillError;
use crate::state::AppState;
use crate::stripe::CheckoutSession;

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,

    /// The assignment produced (or re-returned) by a fulfillment event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<PurchaseAssignment>,
}

impl WebhookResponse {
    fn ack() -> Json<Self> {
        Json(Self {
            received: true,
            assignment: None,
        })
    }

    fn fulfilled(assignment: PurchaseAssignment) -> Json<Self> {
        Json(Self {
            received: true,
            assignment: Some(assignment),
        })
    }
}

/// Handle catalog sync webhooks (`product.*`, `price.*`).
pub async fn catalog_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    verify_signature(&state, &headers, &body)?;

    let event: ProviderEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = ?event.id,
        "Received catalog webhook"
    );

    match event.event_type.as_str() {
        "product.created" | "product.updated" => {
            let payload: ProductPayload = serde_json::from_value(event.data.object)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            state.catalog.upsert(&payload.into_product())?;
        }
        "product.deleted" => {
            let payload: ProductPayload = serde_json::from_value(event.data.object)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            state.catalog.remove(&payload.id)?;
        }
        "price.created" | "price.updated" => {
            let payload: PricePayload = serde_json::from_value(event.data.object)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            handle_price_event(&state, &payload)?;
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Unhandled catalog event");
        }
    }

    Ok(WebhookResponse::ack())
}

/// Handle checkout completion webhooks (`checkout.session.completed`).
pub async fn checkout_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    verify_signature(&state, &headers, &body)?;

    let event: ProviderEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if event.event_type != "checkout.session.completed" {
        tracing::debug!(event_type = %event.event_type, "Ignoring non-checkout event");
        return Ok(WebhookResponse::ack());
    }

    let session: CheckoutSession = serde_json::from_value(event.data.object)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        session_id = %session.id,
        event_id = ?event.id,
        payment_status = ?session.payment_status,
        "Received checkout webhook"
    );

    // Only fulfill paid sessions; async payment methods complete later and
    // redeliver with payment_status=paid.
    if session
        .payment_status
        .as_deref()
        .is_some_and(|s| s != "paid")
    {
        tracing::info!(session_id = %session.id, "Checkout session not paid yet, skipping");
        return Ok(WebhookResponse::ack());
    }

    let assignment = state.fulfillment.fulfill(&session).await.map_err(|err| {
        tracing::warn!(session_id = %session.id, error = %err, "Fulfillment failed");
        match err {
            FulfillError::MissingReference(what) => {
                ApiError::BadRequest(format!("missing reference: {what}"))
            }
            FulfillError::AlreadySold {
                product_id,
                holder_payment,
            } => ApiError::Conflict(format!(
                "product {product_id} already sold to payment {holder_payment}"
            )),
            FulfillError::Upstream(e) => ApiError::Upstream(e.to_string()),
            FulfillError::Store(e) => e.into(),
        }
    })?;

    Ok(WebhookResponse::fulfilled(assignment))
}

/// Apply a price event to the catalog.
fn handle_price_event(state: &AppState, payload: &PricePayload) -> Result<(), ApiError> {
    let Some(unit_amount) = payload.unit_amount else {
        tracing::debug!(product_id = %payload.product, "Price event without unit_amount, skipping");
        return Ok(());
    };

    let currency = payload.currency.as_deref().unwrap_or("usd");
    state
        .catalog
        .update_price(&payload.product, unit_amount, currency)?;

    Ok(())
}

/// Verify the provider signature when a secret is configured.
///
/// Verification happens before the body is parsed; an unsigned or
/// tampered delivery never reaches the event handlers. Without a
/// configured secret, verification is skipped with a warning
/// (development mode).
fn verify_signature(state: &AppState, headers: &HeaderMap, body: &str) -> Result<(), ApiError> {
    let Some(secret) = &state.config.stripe_webhook_secret else {
        tracing::warn!("Webhook secret not configured - skipping signature verification");
        return Ok(());
    };

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".into()))?;

    verify_provider_signature(body, signature, secret).map_err(|e| {
        tracing::warn!(error = %e, "Invalid webhook signature");
        ApiError::BadRequest("Invalid webhook signature".into())
    })
}
