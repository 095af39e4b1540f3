//! Key encoding for the vivarium KV layout.
//!
//! The key layout is an external contract shared with provider tooling and
//! debug dashboards, so keys are human-readable prefixed strings rather
//! than binary encodings:
//!
//! - `product:<id>`: catalog record
//! - `_index:products`: JSON array of product ids
//! - `sale:<productId>`: sale status record
//! - `user:<userId>:<assignmentId>`: one purchase assignment
//! - `claim:<productId>`: per-product sale claim (conditional write)
//! - `fulfillment:<productId>:<paymentId>`: fulfillment idempotency record

use vivarium_core::{AssignmentId, PaymentId, ProductId, UserId};

/// Prefix for catalog product records.
pub const PRODUCT_PREFIX: &str = "product:";

/// The product enumeration index key.
pub const PRODUCT_INDEX: &str = "_index:products";

/// Create a product key.
#[must_use]
pub fn product_key(id: &ProductId) -> String {
    format!("{PRODUCT_PREFIX}{id}")
}

/// Extract the product id from a product key, if it matches the layout.
#[must_use]
pub fn product_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(PRODUCT_PREFIX).filter(|id| !id.is_empty())
}

/// Create a sale status key.
#[must_use]
pub fn sale_key(id: &ProductId) -> String {
    format!("sale:{id}")
}

/// Create a per-product claim key.
#[must_use]
pub fn claim_key(id: &ProductId) -> String {
    format!("claim:{id}")
}

/// Create an assignment key under a user's collection.
#[must_use]
pub fn user_assignment_key(user_id: &UserId, assignment_id: &AssignmentId) -> String {
    format!("user:{user_id}:{assignment_id}")
}

/// Prefix for scanning all assignments in a user's collection.
///
/// Assignment ids are ULIDs, so a lexicographic scan under this prefix
/// returns assignments in acquisition order.
#[must_use]
pub fn user_assignments_prefix(user_id: &UserId) -> String {
    format!("user:{user_id}:")
}

/// Create a fulfillment idempotency key for a `(product, payment)` pair.
#[must_use]
pub fn fulfillment_key(product_id: &ProductId, payment_id: &PaymentId) -> String {
    format!("fulfillment:{product_id}:{payment_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        s.parse().unwrap()
    }

    #[test]
    fn product_key_roundtrip() {
        let key = product_key(&pid("prod_1"));
        assert_eq!(key, "product:prod_1");
        assert_eq!(product_id_from_key(&key), Some("prod_1"));
    }

    #[test]
    fn product_id_rejects_other_keys() {
        assert_eq!(product_id_from_key("sale:prod_1"), None);
        assert_eq!(product_id_from_key("product:"), None);
        assert_eq!(product_id_from_key(PRODUCT_INDEX), None);
    }

    #[test]
    fn user_assignment_key_layout() {
        let user: UserId = "u1".parse().unwrap();
        let assignment = vivarium_core::AssignmentId::generate();
        let key = user_assignment_key(&user, &assignment);
        assert!(key.starts_with(&user_assignments_prefix(&user)));
        assert!(key.ends_with(&assignment.to_string()));
    }

    #[test]
    fn fulfillment_key_layout() {
        let key = fulfillment_key(&pid("prod_1"), &"pay_1".parse().unwrap());
        assert_eq!(key, "fulfillment:prod_1:pay_1");
    }

    #[test]
    fn prefixes_do_not_collide() {
        // "user:u1" must not capture "user:u10" assignments.
        let p1 = user_assignments_prefix(&"u1".parse().unwrap());
        let key = user_assignment_key(
            &"u10".parse().unwrap(),
            &vivarium_core::AssignmentId::generate(),
        );
        assert!(!key.starts_with(&p1));
    }
}
