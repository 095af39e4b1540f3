//! Stripe API types for checkout session lookups.

use serde::Deserialize;
use std::collections::HashMap;

/// A Checkout session, as returned by the sessions API and as embedded in
/// `checkout.session.completed` webhook events.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID (`cs_...`).
    pub id: String,

    /// Our buyer identifier, set when the session was created.
    #[serde(default)]
    pub client_reference_id: Option<String>,

    /// Payment intent ID (`pi_...`) once payment completes.
    #[serde(default)]
    pub payment_intent: Option<String>,

    /// Total amount in minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,

    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,

    /// Payment status (`paid`, `unpaid`, `no_payment_required`).
    #[serde(default)]
    pub payment_status: Option<String>,

    /// Session metadata, set when the session was created.
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Expanded line items, present only when requested with
    /// `expand[]=line_items`.
    #[serde(default)]
    pub line_items: Option<StripeList<LineItem>>,
}

impl CheckoutSession {
    /// The product this session purchased, from metadata if present,
    /// otherwise from the first expanded line item.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        if let Some(id) = self.metadata.get("product_id") {
            return Some(id.as_str());
        }

        self.line_items
            .as_ref()
            .and_then(|items| items.data.first())
            .and_then(|item| item.price.as_ref())
            .map(|price| price.product.as_str())
    }
}

/// A single checkout line item.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    /// The price attached to this item.
    #[serde(default)]
    pub price: Option<LineItemPrice>,
}

/// Price object embedded in a line item.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPrice {
    /// The product this price belongs to.
    pub product: String,

    /// Unit amount in minor currency units.
    #[serde(default)]
    pub unit_amount: Option<i64>,

    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// Stripe list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    /// The elements of the list.
    pub data: Vec<T>,
}

/// Stripe API error response envelope.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    /// The error payload.
    pub error: StripeErrorBody,
}

/// Stripe API error payload.
#[derive(Debug, Deserialize)]
pub struct StripeErrorBody {
    /// Error type (e.g. `invalid_request_error`).
    #[serde(rename = "type")]
    pub error_type: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Machine-readable code, when present.
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_prefers_metadata() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "metadata": {"product_id": "prod_meta"},
            "line_items": {"data": [{"price": {"product": "prod_line"}}]}
        }))
        .unwrap();

        assert_eq!(session.product_id(), Some("prod_meta"));
    }

    #[test]
    fn product_id_falls_back_to_line_items() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "line_items": {"data": [{"price": {"product": "prod_line"}}]}
        }))
        .unwrap();

        assert_eq!(session.product_id(), Some("prod_line"));
    }

    #[test]
    fn product_id_absent_when_unresolvable() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1"
        }))
        .unwrap();

        assert_eq!(session.product_id(), None);
    }
}
