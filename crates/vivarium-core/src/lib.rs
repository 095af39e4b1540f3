//! Core types for the vivarium catalog and fulfillment backend.
//!
//! This crate provides the foundational types used throughout vivarium:
//!
//! - **Identifiers**: `ProductId`, `UserId`, `PaymentId`, `AssignmentId`
//! - **Catalog**: `Product`, `ProviderMetadata`
//! - **Sales**: `SaleStatus`, `SaleState`
//! - **Ownership**: `PurchaseAssignment`, `StatSnapshot`
//!
//! # Money
//!
//! All amounts are integer minor currency units (cents), stored as `i64`,
//! matching the provider's `unit_amount`/`amount_total` fields and avoiding
//! floating point precision issues.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assignment;
pub mod ids;
pub mod product;
pub mod sale;

pub use assignment::{PurchaseAssignment, StatSnapshot};
pub use ids::{AssignmentId, IdError, PaymentId, ProductId, UserId};
pub use product::{Product, ProviderMetadata};
pub use sale::{SaleState, SaleStatus};
