//! Persistence layer for the vivarium catalog and ownership records.
//!
//! Everything sits on a deliberately narrow [`Kv`] adapter (get, put,
//! delete, prefix list, and a single conditional write). The adapter
//! models an eventually-consistent key-value store: no cross-key
//! transactions, no snapshots. The repositories above it are written to
//! survive that contract: idempotent writes, read-side repair, and one
//! `put_if_absent` where exclusivity matters.
//!
//! [`RocksKv`] is the production adapter, backed by RocksDB.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod catalog;
pub mod error;
pub mod keys;
pub mod kv;
pub mod ownership;

pub use catalog::CatalogRepository;
pub use error::{Result, StoreError};
pub use kv::{Kv, RocksKv};
pub use ownership::{ClaimOutcome, OwnershipStore, SaleClaim};
