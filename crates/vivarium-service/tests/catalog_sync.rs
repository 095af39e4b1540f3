//! Integration tests for catalog sync webhooks and queries.

mod common;

use axum::http::{HeaderName, HeaderValue};
use common::{price_created, product_created, product_deleted, TestHarness};
use serde_json::Value;

#[tokio::test]
async fn product_event_appears_in_catalog() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_1", "Pudding"))
        .await;
    response.assert_status_ok();

    let catalog: Vec<Value> = harness.server.get("/catalog").await.json();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0]["id"], "prod_1");
    assert_eq!(catalog[0]["name"], "Pudding");
    // Tagged metadata survives, untagged attributes get defaults.
    assert_eq!(catalog[0]["morph"], "banana");
    assert_eq!(catalog[0]["sex"], "male");
    assert_eq!(catalog[0]["species"], "ball_python");
    assert_eq!(catalog[0]["birth_year"], 2024);
    assert_eq!(catalog[0]["source"], "stripe");
}

#[tokio::test]
async fn product_update_replaces_record() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_1", "Pudding"))
        .await
        .assert_status_ok();

    let mut updated = product_created("prod_1", "Pudding Deluxe");
    updated["type"] = "product.updated".into();
    harness
        .server
        .post("/webhook/catalog")
        .json(&updated)
        .await
        .assert_status_ok();

    let product: Value = harness.server.get("/catalog/prod_1").await.json();
    assert_eq!(product["name"], "Pudding Deluxe");

    let catalog: Vec<Value> = harness.server.get("/catalog").await.json();
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn deleted_product_leaves_catalog_and_index() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_1", "Pudding"))
        .await
        .assert_status_ok();
    harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_2", "Noodle"))
        .await
        .assert_status_ok();

    harness
        .server
        .post("/webhook/catalog")
        .json(&product_deleted("prod_1"))
        .await
        .assert_status_ok();

    let catalog: Vec<Value> = harness.server.get("/catalog").await.json();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0]["id"], "prod_2");

    harness.server.get("/catalog/prod_1").await.assert_status_not_found();

    // Redelivered delete still acks.
    harness
        .server
        .post("/webhook/catalog")
        .json(&product_deleted("prod_1"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn price_event_sets_product_price() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_1", "Pudding"))
        .await
        .assert_status_ok();
    harness
        .server
        .post("/webhook/catalog")
        .json(&price_created("prod_1", 45_000))
        .await
        .assert_status_ok();

    let product: Value = harness.server.get("/catalog/prod_1").await.json();
    assert_eq!(product["price_cents"], 45_000);
    assert_eq!(product["currency"], "eur");
}

#[tokio::test]
async fn price_event_ahead_of_product_is_acked_noop() {
    let harness = TestHarness::new();

    // Provider delivery order is not guaranteed; a price for an unknown
    // product must not fail the delivery.
    harness
        .server
        .post("/webhook/catalog")
        .json(&price_created("prod_future", 45_000))
        .await
        .assert_status_ok();

    let catalog: Vec<Value> = harness.server.get("/catalog").await.json();
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/webhook/catalog")
        .json(&serde_json::json!({
            "id": "evt_x",
            "type": "customer.created",
            "data": {"object": {"id": "cus_1"}}
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/webhook/catalog")
        .text("not json at all")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn status_defaults_to_available() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_1", "Pudding"))
        .await
        .assert_status_ok();

    let status: Value = harness.server.get("/catalog/prod_1/status").await.json();
    assert_eq!(status["status"], "available");
    assert_eq!(status["owner_id"], Value::Null);
}

#[tokio::test]
async fn version_reports_build_metadata() {
    let harness = TestHarness::new();

    let version: Value = harness.server.get("/version").await.json();
    assert_eq!(version["service"], "vivarium");
    assert!(version["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "POST /webhook/catalog"));
}

// ============================================================================
// Signature Verification
// ============================================================================

#[tokio::test]
async fn signed_delivery_is_accepted() {
    let harness = TestHarness::with_webhook_secret("whsec_test");
    let body = serde_json::to_string(&product_created("prod_1", "Pudding")).unwrap();

    let response = harness
        .server
        .post("/webhook/catalog")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&harness.sign(&body)).unwrap(),
        )
        .content_type("application/json")
        .text(body)
        .await;

    response.assert_status_ok();
    let catalog: Vec<Value> = harness.server.get("/catalog").await.json();
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn unsigned_delivery_is_rejected() {
    let harness = TestHarness::with_webhook_secret("whsec_test");

    let response = harness
        .server
        .post("/webhook/catalog")
        .json(&product_created("prod_1", "Pudding"))
        .await;

    response.assert_status_bad_request();
    let catalog: Vec<Value> = harness.server.get("/catalog").await.json();
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let harness = TestHarness::with_webhook_secret("whsec_test");
    let signed_body = serde_json::to_string(&product_created("prod_1", "Pudding")).unwrap();
    let tampered = serde_json::to_string(&product_created("prod_1", "Evil")).unwrap();

    let response = harness
        .server
        .post("/webhook/catalog")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&harness.sign(&signed_body)).unwrap(),
        )
        .content_type("application/json")
        .text(tampered)
        .await;

    response.assert_status_bad_request();
}
