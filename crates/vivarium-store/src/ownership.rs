//! Ownership storage: sale claims, purchase assignments, sale status.
//!
//! Three namespaces cooperate to make fulfillment race-safe on a store with
//! no cross-key transactions:
//!
//! - `claim:<productId>`: written with `put_if_absent`; whoever lands the
//!   claim owns the sale transition. This is the only lock-like construct
//!   in the system.
//! - `fulfillment:<productId>:<paymentId>`: the idempotency record. The
//!   full assignment is stored here, so a redelivered webhook can be
//!   answered from a single key.
//! - `user:<userId>:<assignmentId>`: one key per assignment (no shared
//!   blob, no read-modify-write race); prefix scans serve collection reads.
//!
//! A crash can land between any two of these writes. Assignments are the
//! source of truth: `resolve_sale_status` repairs a missing `sale:` record
//! from the claim and its assignment on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use vivarium_core::{PaymentId, ProductId, PurchaseAssignment, SaleStatus, UserId};

use crate::error::Result;
use crate::keys;
use crate::kv::{from_bytes, to_bytes, Kv};

/// The record stored under a claim key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleClaim {
    /// The product being claimed.
    pub product_id: ProductId,
    /// The payment attempting the claim.
    pub payment_id: PaymentId,
    /// The buyer behind the payment.
    pub user_id: UserId,
    /// When the claim was taken.
    pub claimed_at: DateTime<Utc>,
}

/// Result of attempting to claim a product for a payment.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// The claim was written; this payment owns the sale transition.
    Acquired,
    /// A claim already exists for this same payment, meaning a crashed or
    /// redelivered attempt of our own. Safe to proceed.
    AlreadyOurs,
    /// A different payment holds the claim; this sale is lost.
    Contested {
        /// The claim that won.
        holder: SaleClaim,
    },
}

/// Store for claims, assignments, and sale status over the KV adapter.
#[derive(Clone)]
pub struct OwnershipStore {
    kv: Arc<dyn Kv>,
}

impl OwnershipStore {
    /// Create an ownership store over the given adapter.
    #[must_use]
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    /// Attempt to claim `product_id` for `payment_id` (claim-then-fulfill).
    ///
    /// Exactly one payment can acquire the claim; concurrent attempts for
    /// the same product observe `Contested` and must not mutate anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn claim(
        &self,
        product_id: &ProductId,
        payment_id: &PaymentId,
        user_id: &UserId,
    ) -> Result<ClaimOutcome> {
        let claim = SaleClaim {
            product_id: product_id.clone(),
            payment_id: payment_id.clone(),
            user_id: user_id.clone(),
            claimed_at: Utc::now(),
        };

        let key = keys::claim_key(product_id);
        if self.kv.put_if_absent(&key, &to_bytes(&claim)?)? {
            tracing::info!(product_id = %product_id, payment_id = %payment_id, "Sale claim acquired");
            return Ok(ClaimOutcome::Acquired);
        }

        let holder: SaleClaim = match self.kv.get(&key)? {
            Some(data) => from_bytes(&data)?,
            // Claim vanished between the failed CAS and this read; claims
            // are never deleted, so treat it as ours having won after all.
            None => return Ok(ClaimOutcome::Acquired),
        };

        if holder.payment_id == *payment_id {
            Ok(ClaimOutcome::AlreadyOurs)
        } else {
            tracing::warn!(
                product_id = %product_id,
                payment_id = %payment_id,
                holder_payment = %holder.payment_id,
                "Sale claim contested, rejecting"
            );
            Ok(ClaimOutcome::Contested { holder })
        }
    }

    /// Read the claim for a product, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn get_claim(&self, product_id: &ProductId) -> Result<Option<SaleClaim>> {
        self.kv
            .get(&keys::claim_key(product_id))?
            .map(|data| from_bytes(&data))
            .transpose()
    }

    /// Look up the assignment recorded for a `(product, payment)` pair.
    ///
    /// This is the idempotency check: a hit means the checkout was already
    /// fulfilled and the stored assignment must be returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn find_assignment(
        &self,
        product_id: &ProductId,
        payment_id: &PaymentId,
    ) -> Result<Option<PurchaseAssignment>> {
        self.kv
            .get(&keys::fulfillment_key(product_id, payment_id))?
            .map(|data| from_bytes(&data))
            .transpose()
    }

    /// Record an assignment.
    ///
    /// The idempotency record is written first: once it exists, a
    /// redelivered webhook dedups against it even if the collection write
    /// below never happened. Both writes are idempotent, so re-recording
    /// the same assignment (crash recovery) is safe.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn put_assignment(&self, assignment: &PurchaseAssignment) -> Result<()> {
        let data = to_bytes(assignment)?;

        let dedup_key = keys::fulfillment_key(&assignment.product_id, &assignment.payment_id);
        self.kv.put(&dedup_key, &data)?;

        let user_key = keys::user_assignment_key(&assignment.user_id, &assignment.assignment_id);
        self.kv.put(&user_key, &data)?;

        tracing::info!(
            assignment_id = %assignment.assignment_id,
            user_id = %assignment.user_id,
            product_id = %assignment.product_id,
            "Assignment recorded"
        );

        Ok(())
    }

    /// List a user's collection in acquisition order.
    ///
    /// Returns an empty vec, never an error, for users with no purchases.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn list_user_assignments(&self, user_id: &UserId) -> Result<Vec<PurchaseAssignment>> {
        let prefix = keys::user_assignments_prefix(user_id);
        let keys = self.kv.list(&prefix)?;

        let mut assignments = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(data) = self.kv.get(key)? {
                assignments.push(from_bytes(&data)?);
            }
        }

        Ok(assignments)
    }

    /// Read the raw sale status record, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn get_sale_status(&self, product_id: &ProductId) -> Result<Option<SaleStatus>> {
        self.kv
            .get(&keys::sale_key(product_id))?
            .map(|data| from_bytes(&data))
            .transpose()
    }

    /// Write a sale status record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn put_sale_status(&self, status: &SaleStatus) -> Result<()> {
        self.kv
            .put(&keys::sale_key(&status.product_id), &to_bytes(status)?)
    }

    /// Resolve the effective sale status of a product, repairing on read.
    ///
    /// The assignment+sale-status pair is written non-atomically; a crash
    /// between the two leaves a product owned but still `available`. The
    /// assignment is the source of truth, so a missing sale record is
    /// reconstructed from the claim and its assignment here.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn resolve_sale_status(&self, product_id: &ProductId) -> Result<SaleStatus> {
        if let Some(status) = self.get_sale_status(product_id)? {
            return Ok(status);
        }

        if let Some(claim) = self.get_claim(product_id)? {
            if let Some(assignment) = self.find_assignment(product_id, &claim.payment_id)? {
                let mut status = SaleStatus::sold(
                    product_id.clone(),
                    assignment.user_id.clone(),
                    assignment.payment_id.clone(),
                );
                status.sold_at = Some(assignment.acquired_at);

                tracing::warn!(
                    product_id = %product_id,
                    assignment_id = %assignment.assignment_id,
                    "Sale status missing for fulfilled purchase, repairing from assignment"
                );
                self.put_sale_status(&status)?;

                return Ok(status);
            }
            // Claimed but not yet fulfilled: the webhook will be
            // redelivered and finish the job. Until then nothing is owned.
        }

        Ok(SaleStatus::available(product_id.clone()))
    }
}
