//! Common test utilities for vivarium integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use vivarium_service::crypto::hmac_sha256_hex;
use vivarium_service::{create_router, AppState, ServiceConfig};
use vivarium_store::RocksKv;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Webhook signing secret, when signature verification is enabled.
    pub webhook_secret: Option<String>,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and no signature
    /// verification.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a harness that verifies webhook signatures against the given
    /// secret.
    pub fn with_webhook_secret(secret: &str) -> Self {
        Self::build(Some(secret.to_string()))
    }

    fn build(webhook_secret: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let kv = RocksKv::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            stripe_api_key: None,
            stripe_webhook_secret: webhook_secret.clone(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(kv), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            webhook_secret,
        }
    }

    /// Build a valid `Stripe-Signature` header for the given body.
    ///
    /// # Panics
    ///
    /// Panics if the harness has no webhook secret.
    pub fn sign(&self, body: &str) -> String {
        let secret = self
            .webhook_secret
            .as_deref()
            .expect("harness has no webhook secret");
        let sig = hmac_sha256_hex(secret, &format!("1700000000.{body}"));
        format!("t=1700000000,v1={sig}")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A `product.created` event body.
pub fn product_created(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": format!("evt_{id}"),
        "type": "product.created",
        "data": {"object": {
            "id": id,
            "name": name,
            "description": "Captive bred",
            "images": [format!("https://example.com/{id}.jpg")],
            "metadata": {"morph": "banana", "sex": "male"}
        }}
    })
}

/// A `product.deleted` event body.
pub fn product_deleted(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": format!("evt_del_{id}"),
        "type": "product.deleted",
        "data": {"object": {"id": id}}
    })
}

/// A `price.created` event body.
pub fn price_created(product_id: &str, unit_amount: i64) -> serde_json::Value {
    serde_json::json!({
        "id": format!("evt_price_{product_id}"),
        "type": "price.created",
        "data": {"object": {
            "product": product_id,
            "unit_amount": unit_amount,
            "currency": "eur"
        }}
    })
}

/// A `checkout.session.completed` event body.
pub fn checkout_completed(
    session_id: &str,
    user_id: &str,
    product_id: &str,
    payment_id: &str,
) -> serde_json::Value {
    serde_json::json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": session_id,
            "client_reference_id": user_id,
            "payment_intent": payment_id,
            "amount_total": 45000,
            "currency": "eur",
            "payment_status": "paid",
            "metadata": {"product_id": product_id}
        }}
    })
}
