//! Application state.

use std::sync::Arc;

use vivarium_store::{CatalogRepository, Kv, OwnershipStore};

use crate::config::ServiceConfig;
use crate::fulfillment::FulfillmentEngine;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Catalog repository.
    pub catalog: CatalogRepository,

    /// Ownership store (claims, assignments, sale status).
    pub ownership: OwnershipStore,

    /// The fulfillment engine.
    pub fulfillment: FulfillmentEngine,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe client for session lookups (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state over a KV adapter.
    #[must_use]
    pub fn new(kv: Arc<dyn Kv>, config: ServiceConfig) -> Self {
        let catalog = CatalogRepository::new(kv.clone());
        let ownership = OwnershipStore::new(kv);

        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(key))
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - line-item lookups will not be available");
        }

        let fulfillment =
            FulfillmentEngine::new(catalog.clone(), ownership.clone(), stripe.clone());

        Self {
            catalog,
            ownership,
            fulfillment,
            config,
            stripe,
        }
    }
}
