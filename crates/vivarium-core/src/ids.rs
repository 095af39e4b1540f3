//! Identifier types for vivarium.
//!
//! Product, user, and payment identifiers are assigned by external systems
//! (the payment provider and the shop frontend) and treated as opaque
//! strings. Assignment identifiers are generated locally as ULIDs so that a
//! user's collection sorts chronologically for free.
//!
//! # Macro-based ID Types
//!
//! The `opaque_id_type!` macro reduces boilerplate for string-based
//! identifier types, ensuring consistent implementation of serialization,
//! parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Macro to define an opaque string identifier type with standard trait
/// implementations.
///
/// This macro generates a newtype wrapper around `String` with
/// implementations for:
/// - `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as string, rejecting the empty string and
///   the `:` key delimiter)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
macro_rules! opaque_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a string.
            ///
            /// The persisted key layout delimits compound keys with `:`, and
            /// some identifiers arrive from untrusted input (the buyer's
            /// `client_reference_id`), so a `:` inside an id would let one
            /// id forge keys under another id's prefix. Rejected at the
            /// boundary.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` for the empty string and
            /// `IdError::Delimiter` for a value containing `:`.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(IdError::Empty);
                }
                if value.contains(':') {
                    return Err(IdError::Delimiter);
                }
                Ok(Self(value))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id_type!(
    ProductId,
    "A product identifier assigned by the payment provider (e.g. `prod_...`).\n\nOpaque and unique; never generated locally."
);
opaque_id_type!(
    UserId,
    "A buyer identifier supplied by the shop frontend as `client_reference_id`.\n\nAn opaque hash; vivarium never inspects its structure."
);
opaque_id_type!(
    PaymentId,
    "A payment identifier from the provider (payment intent or session id).\n\nTogether with a `ProductId` it forms the fulfillment idempotency key."
);

/// An assignment identifier using ULID for time-ordering.
///
/// Assignment IDs are generated at fulfillment time; their lexicographic
/// order matches acquisition order, so prefix scans over a user's
/// collection come back chronologically sorted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssignmentId(Ulid);

impl AssignmentId {
    /// Generate a new `AssignmentId` with the current timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Create an `AssignmentId` from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }
}

impl FromStr for AssignmentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssignmentId({})", self.0)
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AssignmentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssignmentId> for String {
    fn from(id: AssignmentId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input was empty.
    #[error("identifier must not be empty")]
    Empty,

    /// The input contained the key delimiter `:`.
    #[error("identifier must not contain ':'")]
    Delimiter,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}
