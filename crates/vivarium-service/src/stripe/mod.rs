//! Stripe API integration: checkout session lookups and typed payloads.

mod client;
mod types;

pub use client::{StripeClient, StripeError};
pub use types::{CheckoutSession, LineItem, LineItemPrice, StripeList};
