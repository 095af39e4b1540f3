//! Sale status records.
//!
//! Sale state lives in its own namespace, separate from the product record:
//! a product describes the animal, the sale status says who owns it. The
//! only legal transition is available → sold, exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PaymentId, ProductId, UserId};

/// Whether a product is still for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    /// Not yet sold.
    Available,
    /// Sold to exactly one buyer.
    Sold,
}

/// The sale status of a single product.
///
/// Invariant: `state == Sold` implies `owner_id` and `payment_id` are both
/// present. The constructors are the only way to build a record, so the
/// invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleStatus {
    /// The product this status belongs to.
    pub product_id: ProductId,

    /// Current sale state.
    pub status: SaleState,

    /// Owner, present once sold.
    #[serde(default)]
    pub owner_id: Option<UserId>,

    /// When the sale completed.
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,

    /// The payment that completed the sale.
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
}

impl SaleStatus {
    /// Status for a product with no sale record: available, no owner.
    #[must_use]
    pub const fn available(product_id: ProductId) -> Self {
        Self {
            product_id,
            status: SaleState::Available,
            owner_id: None,
            sold_at: None,
            payment_id: None,
        }
    }

    /// Status for a completed sale.
    #[must_use]
    pub fn sold(product_id: ProductId, owner_id: UserId, payment_id: PaymentId) -> Self {
        Self {
            product_id,
            status: SaleState::Sold,
            owner_id: Some(owner_id),
            sold_at: Some(Utc::now()),
            payment_id: Some(payment_id),
        }
    }

    /// Whether this record represents a completed sale.
    #[must_use]
    pub fn is_sold(&self) -> bool {
        self.status == SaleState::Sold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_has_no_owner() {
        let status = SaleStatus::available("prod_1".parse().unwrap());
        assert!(!status.is_sold());
        assert!(status.owner_id.is_none());
        assert!(status.payment_id.is_none());
    }

    #[test]
    fn sold_carries_owner_and_payment() {
        let status = SaleStatus::sold(
            "prod_1".parse().unwrap(),
            "u1".parse().unwrap(),
            "pay_1".parse().unwrap(),
        );
        assert!(status.is_sold());
        assert!(status.owner_id.is_some());
        assert!(status.payment_id.is_some());
        assert!(status.sold_at.is_some());
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&SaleState::Available).unwrap();
        assert_eq!(json, "\"available\"");
        let json = serde_json::to_string(&SaleState::Sold).unwrap();
        assert_eq!(json, "\"sold\"");
    }
}
