//! Purchase fulfillment: claim-then-fulfill ownership assignment.
//!
//! The engine turns a completed checkout session into exactly one
//! `PurchaseAssignment`, no matter how many times the event is delivered
//! and no matter how many payments race for the same product. Order of
//! operations is load-bearing:
//!
//! 1. resolve references (no mutations yet)
//! 2. dedup against the fulfillment index
//! 3. claim the product (the only conditional write)
//! 4. record the assignment, then the sale status
//!
//! Steps 4's two writes are not atomic; `resolve_sale_status` repairs the
//! gap on read, and a redelivered event re-asserts the writes here.

use std::sync::Arc;

use vivarium_core::{PaymentId, Product, ProductId, PurchaseAssignment, SaleStatus, UserId};
use vivarium_store::{CatalogRepository, ClaimOutcome, OwnershipStore};

use crate::stripe::{CheckoutSession, StripeClient, StripeError};

/// Fulfillment failure modes.
#[derive(Debug, thiserror::Error)]
pub enum FulfillError {
    /// The session lacks a buyer or product reference, even after a
    /// provider lookup. Nothing was mutated.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// A different payment already owns this product.
    #[error("product {product_id} already sold (payment {holder_payment})")]
    AlreadySold {
        /// The contested product.
        product_id: ProductId,
        /// The payment that won the claim.
        holder_payment: PaymentId,
    },

    /// Provider lookup failed; the sender will redeliver.
    #[error("provider lookup failed: {0}")]
    Upstream(#[from] StripeError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] vivarium_store::StoreError),
}

/// The purchase fulfillment engine.
#[derive(Clone)]
pub struct FulfillmentEngine {
    catalog: CatalogRepository,
    ownership: OwnershipStore,
    stripe: Option<Arc<StripeClient>>,
}

impl FulfillmentEngine {
    /// Create an engine over the repositories and an optional provider
    /// client for line-item lookups.
    #[must_use]
    pub fn new(
        catalog: CatalogRepository,
        ownership: OwnershipStore,
        stripe: Option<Arc<StripeClient>>,
    ) -> Self {
        Self {
            catalog,
            ownership,
            stripe,
        }
    }

    /// Fulfill a completed checkout session.
    ///
    /// Idempotent per `(product, payment)`: a redelivered event returns the
    /// original assignment. Exactly one payment can win a product; losers
    /// get `AlreadySold` and nothing is overwritten.
    pub async fn fulfill(
        &self,
        session: &CheckoutSession,
    ) -> Result<PurchaseAssignment, FulfillError> {
        // Step 1: resolve references before touching the store.
        let user_id: UserId = session
            .client_reference_id
            .as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| FulfillError::MissingReference("client_reference_id".into()))?;

        // Payment intent is the stable payment identity; fall back to the
        // session id for sessions that completed without one.
        let payment_id: PaymentId = session
            .payment_intent
            .as_deref()
            .unwrap_or(&session.id)
            .parse()
            .map_err(|_| FulfillError::MissingReference("payment id".into()))?;

        let product_id = self.resolve_product_id(session).await?;

        // Step 2: dedup. A hit means a previous delivery already fulfilled
        // this purchase; re-assert the idempotent writes (a crash may have
        // cut the first attempt short) and return the original assignment.
        if let Some(existing) = self.ownership.find_assignment(&product_id, &payment_id)? {
            tracing::info!(
                product_id = %product_id,
                payment_id = %payment_id,
                assignment_id = %existing.assignment_id,
                "Duplicate fulfillment request, returning existing assignment"
            );
            self.ownership.put_assignment(&existing)?;
            self.ownership.resolve_sale_status(&product_id)?;
            return Ok(existing);
        }

        // Step 3: claim the product. Single winner per product.
        match self.ownership.claim(&product_id, &payment_id, &user_id)? {
            ClaimOutcome::Acquired | ClaimOutcome::AlreadyOurs => {}
            ClaimOutcome::Contested { holder } => {
                return Err(FulfillError::AlreadySold {
                    product_id,
                    holder_payment: holder.payment_id,
                });
            }
        }

        // Step 4: catalog detail is best-effort; a missed sync event must
        // not block a paid purchase.
        let product = match self.catalog.get(&product_id)? {
            Some(product) => product,
            None => {
                tracing::warn!(product_id = %product_id, "Product not in catalog, using placeholder");
                Product::placeholder(product_id.clone())
            }
        };

        let price_paid_cents = session
            .amount_total
            .or(product.price_cents)
            .unwrap_or(0);
        let currency = session
            .currency
            .clone()
            .or_else(|| product.currency.clone())
            .unwrap_or_else(|| "usd".to_string());

        let assignment =
            PurchaseAssignment::new(user_id, &product, payment_id, price_paid_cents, currency);

        // Steps 5-6: assignment first (it is the source of truth), then the
        // sale status. The read path repairs a crash between the two.
        self.ownership.put_assignment(&assignment)?;

        let status = SaleStatus::sold(
            product_id,
            assignment.user_id.clone(),
            assignment.payment_id.clone(),
        );
        self.ownership.put_sale_status(&status)?;

        tracing::info!(
            assignment_id = %assignment.assignment_id,
            user_id = %assignment.user_id,
            product_id = %assignment.product_id,
            price_paid_cents = assignment.price_paid_cents,
            "Purchase fulfilled"
        );

        Ok(assignment)
    }

    /// Product id from session metadata, else a line-item lookup.
    async fn resolve_product_id(
        &self,
        session: &CheckoutSession,
    ) -> Result<ProductId, FulfillError> {
        if let Some(id) = session.product_id() {
            return id
                .parse()
                .map_err(|_| FulfillError::MissingReference("product id".into()));
        }

        let Some(stripe) = &self.stripe else {
            return Err(FulfillError::MissingReference(
                "product id (no provider client for line-item lookup)".into(),
            ));
        };

        tracing::debug!(session_id = %session.id, "No product in metadata, expanding line items");
        let expanded = stripe.get_checkout_session(&session.id).await?;

        expanded
            .product_id()
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| FulfillError::MissingReference("product id".into()))
    }
}
