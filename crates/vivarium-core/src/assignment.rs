//! Purchase assignments: the append-only record of ownership.
//!
//! An assignment is created once per successful checkout and never mutated
//! or deleted afterwards. It is the source of truth for "who owns what";
//! sale status records are derived from assignments when the two disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AssignmentId, PaymentId, Product, ProductId, UserId};

/// Initial care stats snapshotted onto a freshly purchased pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    /// Satiation, 0-100.
    pub hunger: u8,
    /// Hydration, 0-100.
    pub water: u8,
    /// Enclosure temperature in Fahrenheit.
    pub temperature: u8,
    /// Enclosure humidity percentage.
    pub humidity: u8,
    /// Overall health, 0-100.
    pub health: u8,
    /// Stress level, 0-100 (lower is better).
    pub stress: u8,
    /// Enclosure cleanliness, 0-100.
    pub cleanliness: u8,
    /// Happiness, 0-100.
    pub happiness: u8,
}

impl Default for StatSnapshot {
    fn default() -> Self {
        Self {
            hunger: 100,
            water: 100,
            temperature: 80,
            humidity: 50,
            health: 100,
            stress: 10,
            cleanliness: 100,
            happiness: 100,
        }
    }
}

/// A recorded purchase: one product assigned to one buyer.
///
/// At most one assignment exists per `(product_id, payment_id)` pair; that
/// pair is the idempotency key under at-least-once webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseAssignment {
    /// Unique, time-ordered assignment identifier.
    pub assignment_id: AssignmentId,

    /// The buyer.
    pub user_id: UserId,

    /// The purchased product.
    pub product_id: ProductId,

    /// Product name at purchase time (denormalized for the game client).
    pub name: String,

    /// Species at purchase time.
    pub species: String,

    /// Morph at purchase time.
    pub morph: String,

    /// Primary product image, if any.
    #[serde(default)]
    pub image: Option<String>,

    /// When the purchase was fulfilled.
    pub acquired_at: DateTime<Utc>,

    /// The payment that funded this purchase.
    pub payment_id: PaymentId,

    /// Amount paid in minor currency units (cents).
    pub price_paid_cents: i64,

    /// ISO currency code for `price_paid_cents`.
    pub currency: String,

    /// Initial care stats.
    pub stats: StatSnapshot,
}

impl PurchaseAssignment {
    /// Build a new assignment from a completed checkout.
    ///
    /// Generates a fresh `AssignmentId` and stat snapshot; product detail is
    /// denormalized from the catalog record (or a placeholder).
    #[must_use]
    pub fn new(
        user_id: UserId,
        product: &Product,
        payment_id: PaymentId,
        price_paid_cents: i64,
        currency: String,
    ) -> Self {
        Self {
            assignment_id: AssignmentId::generate(),
            user_id,
            product_id: product.id.clone(),
            name: product.name.clone(),
            species: product.species.clone(),
            morph: product.morph.clone(),
            image: product.primary_image().map(String::from),
            acquired_at: Utc::now(),
            payment_id,
            price_paid_cents,
            currency,
            stats: StatSnapshot::default(),
        }
    }
}
