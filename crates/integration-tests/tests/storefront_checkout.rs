//! Storefront cart and checkout against the fake backend.

use freshcatch_core::Role;
use freshcatch_integration_tests::{FakeBackend, spawn_storefront, token};
use freshcatch_storefront::checkout::service_today;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

struct Shop {
    backend: FakeBackend,
    url: String,
    client: Client,
    token: String,
}

impl Shop {
    async fn start(user: &str) -> Self {
        let (backend, backend_url) = FakeBackend::spawn().await;
        let url = spawn_storefront(&backend_url).await;
        Self {
            backend,
            url,
            client: Client::new(),
            token: token(user, Role::User),
        }
    }

    async fn call(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.url))
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("request");
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn add(&self, product_id: &str, quantity: u32) -> Value {
        let (status, cart) = self
            .call(
                reqwest::Method::POST,
                "/api/cart/items",
                Some(json!({ "product_id": product_id, "quantity": quantity })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{cart}");
        cart
    }
}

fn checkout_form() -> Value {
    json!({
        "street": "21 Hill Road, Bandra West",
        "pincode": "400050",
        "landmark": "Near Mehboob Studio",
        "phone": "9876543210",
        "date": service_today().succ_opt().expect("tomorrow").to_string(),
        "time": "evening",
        "payment_method": "whatsapp"
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let shop = Shop::start("u1").await;
    let response = shop
        .client
        .get(format!("{}/health", shop.url))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cart_requires_a_token() {
    let shop = Shop::start("u1").await;
    let response = shop
        .client
        .get(format!("{}/api/cart", shop.url))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_totals_follow_mutations() {
    let shop = Shop::start("u1").await;

    shop.add("pomfret", 1).await;
    shop.add("prawns", 1).await;
    let cart = shop.add("pomfret", 1).await;

    assert_eq!(cart["item_count"], 2);
    assert_eq!(cart["total_display"], "₹1780.00");

    let line = cart["items"][1]["id"].as_str().expect("line id").to_string();
    let (status, cart) = shop
        .call(
            reqwest::Method::PATCH,
            &format!("/api/cart/items/{line}"),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["item_count"], 1);
    assert_eq!(cart["total_display"], "₹1300.00");
}

#[tokio::test]
async fn test_clear_needs_confirmation() {
    let shop = Shop::start("u1").await;
    shop.add("surmai", 2).await;

    let (status, body) = shop.call(reqwest::Method::DELETE, "/api/cart", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["confirm"].is_array());

    let (status, cart) = shop
        .call(reqwest::Method::DELETE, "/api/cart?confirm=true", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_empty_cart_checkout_never_reaches_backend() {
    let shop = Shop::start("u1").await;

    let (status, body) = shop
        .call(reqwest::Method::POST, "/api/checkout", Some(checkout_form()))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["cart"].is_array());
    let calls = shop.backend.calls();
    assert!(!calls.iter().any(|c| c == "POST /orders" || c == "GET /profile"), "{calls:?}");
}

#[tokio::test]
async fn test_invalid_contact_details_are_reported_per_field() {
    let shop = Shop::start("u1").await;
    shop.add("pomfret", 1).await;

    let mut form = checkout_form();
    form["phone"] = json!("5123456789");
    form["pincode"] = json!("40005");

    let (status, body) = shop
        .call(reqwest::Method::POST, "/api/checkout", Some(form))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["phone"].is_array());
    assert!(body["fields"]["pincode"].is_array());
    assert!(!shop.backend.calls().iter().any(|c| c == "POST /orders"));
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let shop = Shop::start("u1").await;
    shop.add("pomfret", 2).await;
    shop.add("prawns", 1).await;

    let (status, result) = shop
        .call(reqwest::Method::POST, "/api/checkout", Some(checkout_form()))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{result}");
    assert_eq!(result["cart_cleared"], true);
    assert_eq!(result["order"]["status"], "pending");
    assert_eq!(result["order"]["badge"]["label"], "Pending");
    assert_eq!(result["order"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(result["payment"]["method"], "whatsapp");
    assert!(
        result["payment"]["link"]
            .as_str()
            .is_some_and(|link| link.starts_with("https://wa.me/919820012345?text="))
    );

    let (_, cart) = shop.call(reqwest::Method::GET, "/api/cart", None).await;
    assert_eq!(cart["item_count"], 0);

    let (_, orders) = shop.call(reqwest::Method::GET, "/api/orders", None).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_failed_cart_clear_still_reports_the_order() {
    let shop = Shop::start("u1").await;
    shop.add("surmai", 1).await;
    shop.backend.fail_cart_clear();

    let (status, result) = shop
        .call(reqwest::Method::POST, "/api/checkout", Some(checkout_form()))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{result}");
    assert_eq!(result["cart_cleared"], false);
    assert!(result["warning"].is_string());
}
