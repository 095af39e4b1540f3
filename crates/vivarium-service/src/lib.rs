//! Vivarium HTTP service.
//!
//! This crate provides the HTTP API for the vivarium shop backend,
//! including:
//!
//! - Catalog sync webhooks (product and price events)
//! - Purchase fulfillment webhooks (checkout completion)
//! - Catalog, sale status, and collection queries
//!
//! Webhook endpoints verify an HMAC-SHA256 signature when a signing
//! secret is configured. Event processing is idempotent end to end:
//! redelivered events converge on the same stored state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod fulfillment;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use fulfillment::{FulfillError, FulfillmentEngine};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
