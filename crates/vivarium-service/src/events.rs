//! Provider webhook payloads and normalization into catalog records.
//!
//! Events are processed and discarded; nothing here is persisted. Replay
//! safety comes from idempotent catalog writes and the fulfillment dedup
//! index, not from remembering event ids.

use serde::Deserialize;
use std::collections::HashMap;

use vivarium_core::{Product, ProductId, ProviderMetadata};

/// Top-level webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct ProviderEvent {
    /// Event type (`product.created`, `price.updated`, ...).
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event ID, when the sender includes one (logging only).
    #[serde(default)]
    pub id: Option<String>,

    /// Event data container.
    pub data: ProviderEventData,
}

/// Event data container; the shape of `object` depends on `event_type`.
#[derive(Debug, Deserialize)]
pub struct ProviderEventData {
    /// The event object.
    pub object: serde_json::Value,
}

/// A product object from a `product.*` event.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    /// Provider product ID.
    pub id: ProductId,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Description, when present.
    #[serde(default)]
    pub description: Option<String>,

    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,

    /// Free-form metadata tags.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ProductPayload {
    /// Normalize this payload into a catalog record, applying defaults for
    /// untagged attributes.
    #[must_use]
    pub fn into_product(self) -> Product {
        let metadata = ProviderMetadata {
            species: self.metadata.get("species").cloned(),
            morph: self.metadata.get("morph").cloned(),
            sex: self.metadata.get("sex").cloned(),
            birth_year: self
                .metadata
                .get("birth_year")
                .and_then(|s| s.parse().ok()),
            weight_grams: self
                .metadata
                .get("weight_grams")
                .and_then(|s| s.parse().ok()),
        };

        let name = self
            .name
            .unwrap_or_else(|| format!("Snake {}", self.id));

        Product::from_provider(self.id, name, self.description, self.images, metadata)
    }
}

/// A price object from a `price.*` event.
#[derive(Debug, Deserialize)]
pub struct PricePayload {
    /// The product this price belongs to.
    pub product: ProductId,

    /// Unit amount in minor currency units. Absent for metered or
    /// custom-amount prices, which the catalog ignores.
    #[serde(default)]
    pub unit_amount: Option<i64>,

    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
}
