//! Admin access control and order status management.

use freshcatch_core::{OrderStatus, Role};
use freshcatch_integration_tests::{FakeBackend, spawn_admin, token};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn start() -> (FakeBackend, String) {
    let (backend, backend_url) = FakeBackend::spawn().await;
    let url = spawn_admin(&backend_url).await;
    (backend, url)
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (_, url) = start().await;
    let response = Client::new()
        .get(format!("{url}/api/dashboard"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shoppers_are_forbidden() {
    let (backend, url) = start().await;
    let response = Client::new()
        .get(format!("{url}/api/orders"))
        .bearer_auth(token("u1", Role::User))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_dashboard_counts_pending_orders() {
    let (backend, url) = start().await;
    let _ = backend.seed_order("u1", OrderStatus::Pending);
    let _ = backend.seed_order("u2", OrderStatus::Delivered);

    let stats: Value = Client::new()
        .get(format!("{url}/api/dashboard"))
        .bearer_auth(token("a1", Role::Admin))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(stats["total_orders"], 2);
    assert_eq!(stats["pending_orders"], 1);
    assert_eq!(stats["revenue_display"], "₹0.00");
}

#[tokio::test]
async fn test_status_options_cover_every_status() {
    let (_, url) = start().await;
    let options: Vec<Value> = Client::new()
        .get(format!("{url}/api/orders/status-options"))
        .bearer_auth(token("a1", Role::Admin))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    let statuses: Vec<&str> = options.iter().filter_map(|o| o["status"].as_str()).collect();
    assert_eq!(
        statuses,
        vec!["pending", "confirmed", "out-for-delivery", "delivered", "cancelled"]
    );
}

#[tokio::test]
async fn test_status_update_moves_order() {
    let (backend, url) = start().await;
    let id = backend.seed_order("u1", OrderStatus::Pending);

    let response = Client::new()
        .put(format!("{url}/api/orders/{id}/status"))
        .bearer_auth(token("a1", Role::Admin))
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let order: Value = response.json().await.expect("json");
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["badge"]["label"], "Confirmed");
}

#[tokio::test]
async fn test_rejected_transition_is_a_conflict() {
    let (backend, url) = start().await;
    let id = backend.seed_order("u1", OrderStatus::Delivered);

    let response = Client::new()
        .put(format!("{url}/api/orders/{id}/status"))
        .bearer_auth(token("a1", Role::Admin))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "transition_rejected");

    let attempts = backend
        .calls()
        .iter()
        .filter(|c| c.ends_with("/status"))
        .count();
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_unknown_status_filter_is_rejected() {
    let (backend, url) = start().await;
    let response = Client::new()
        .get(format!("{url}/api/orders?status=shipped"))
        .bearer_auth(token("a1", Role::Admin))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(backend.calls().is_empty());
}
