//! Integration tests for FreshCatch.
//!
//! Both services run in-process on ephemeral ports, pointed at a fake REST
//! backend that also runs in-process. Nothing external is needed:
//!
//! ```bash
//! cargo test -p freshcatch-integration-tests
//! ```
//!
//! Identity tokens are HS256-signed with [`TOKEN_SECRET`]; the services are
//! built with a matching verifier instead of the production RSA key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use freshcatch_core::identity::{Claims, TokenVerifier};
use freshcatch_core::{OrderStatus, Role};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Shared secret for test identity tokens.
pub const TOKEN_SECRET: &[u8] = b"integration-k3y-7f1c9a2e5b8d4f60";

/// Service key the services send and the fake backend expects.
pub const API_KEY: &str = "fc_test_Hq3vN8zLw2Tr5Yb9Kx1M";

/// Serve `router` on an ephemeral local port and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

/// A signed identity token for `user_id`.
///
/// # Panics
///
/// Panics if signing fails.
#[must_use]
pub fn token(user_id: &str, role: Role) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs()
        + 3600;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        role: Some(role),
        verified: true,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TOKEN_SECRET),
    )
    .expect("sign token")
}

#[must_use]
pub fn verifier() -> TokenVerifier {
    TokenVerifier::hmac(TOKEN_SECRET)
}

fn common_env(backend_url: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        ("FRESHCATCH_ENV", "development".to_string()),
        ("FRESHCATCH_API_BASE_URL", backend_url.to_string()),
        ("FRESHCATCH_API_KEY", API_KEY.to_string()),
        ("FRESHCATCH_IDENTITY_PUBLIC_KEY", "unused-with-hmac-verifier".to_string()),
        ("FRESHCATCH_WHATSAPP_NUMBER", "919820012345".to_string()),
        ("FRESHCATCH_PAYMENT_LINK", "https://rzp.io/l/freshcatch".to_string()),
    ])
}

/// Start a storefront talking to `backend_url`. Returns its base URL.
///
/// # Panics
///
/// Panics if the configuration or state cannot be built.
pub async fn spawn_storefront(backend_url: &str) -> String {
    use freshcatch_storefront::{config::StorefrontConfig, state::AppState};

    let env = common_env(backend_url);
    let config = StorefrontConfig::from_lookup(|key| env.get(key).cloned())
        .expect("storefront config");
    let state = AppState::with_verifier(config, verifier()).expect("storefront state");
    serve(freshcatch_storefront::app(state)).await
}

/// Start an admin service talking to `backend_url`. Returns its base URL.
///
/// # Panics
///
/// Panics if the configuration or state cannot be built.
pub async fn spawn_admin(backend_url: &str) -> String {
    use freshcatch_admin::{config::AdminConfig, state::AppState};

    let env = common_env(backend_url);
    let config =
        AdminConfig::from_lookup(|key| env.get(key).cloned()).expect("admin config");
    let state = AppState::with_verifier(config, verifier()).expect("admin state");
    serve(freshcatch_admin::app(state)).await
}

// =============================================================================
// Fake backend
// =============================================================================

/// In-memory stand-in for the FreshCatch REST backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

#[derive(Default)]
struct BackendState {
    carts: HashMap<String, Vec<Value>>,
    orders: Vec<Value>,
    next_id: u64,
    /// `METHOD path` of every authorized request, in arrival order.
    calls: Vec<String>,
    fail_cart_clear: bool,
}

/// Catalogue served by the fake: id, name, price per portion.
const CATALOGUE: &[(&str, &str, &str)] = &[
    ("pomfret", "Silver Pomfret", "650.00"),
    ("prawns", "Tiger Prawns", "480.00"),
    ("surmai", "King Fish (Surmai)", "320.00"),
];

impl FakeBackend {
    /// Start the fake and return it with its base URL.
    pub async fn spawn() -> (Self, String) {
        let backend = Self::default();
        let url = serve(backend.router()).await;
        (backend, url)
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().expect("fake backend lock")
    }

    /// Requests received so far, as `METHOD path`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Make `DELETE /cart` fail with 503 from now on.
    pub fn fail_cart_clear(&self) {
        self.lock().fail_cart_clear = true;
    }

    /// Insert an order in `status` and return its id.
    #[must_use]
    pub fn seed_order(&self, owner: &str, status: OrderStatus) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("o{}", state.next_id);
        state.orders.push(json!({
            "id": id,
            "owner": owner,
            "status": status.as_str(),
            "items": [],
            "delivery": {
                "address": {
                    "street": "4 Chimbai Road",
                    "city": "Mumbai",
                    "state": "Maharashtra",
                    "pincode": "400050"
                },
                "phone": "9876543210",
                "date": "2026-10-16",
                "time": "morning"
            },
            "payment_method": "whatsapp",
            "total_amount": "650.00",
            "created_at": "2026-10-15T06:00:00Z"
        }));
        id
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/products", get(list_products))
            .route("/profile", get(get_profile))
            .route("/cart", get(get_cart).delete(clear_cart))
            .route("/cart/items", post(add_item))
            .route("/cart/items/{id}", patch(update_item).delete(remove_item))
            .route("/orders", post(create_order).get(list_orders))
            .route("/admin/stats", get(stats))
            .route("/admin/orders", get(admin_orders))
            .route("/admin/orders/{id}/status", put(update_status))
            .with_state(self.clone())
    }
}

/// Check the service key and record the call.
fn admit<'a>(
    backend: &'a FakeBackend,
    headers: &HeaderMap,
    call: String,
) -> Result<MutexGuard<'a, BackendState>, Response> {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    }
    let mut state = backend.lock();
    state.calls.push(call);
    Ok(state)
}

fn caller(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn product(id: &str) -> Option<Value> {
    CATALOGUE
        .iter()
        .find(|(pid, _, _)| *pid == id)
        .map(|(id, name, price)| json!({ "id": id, "name": name, "price": price }))
}

async fn list_products(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    if let Err(r) = admit(&b, &headers, "GET /products".into()) {
        return r;
    }
    let products: Vec<Value> = CATALOGUE.iter().filter_map(|(id, _, _)| product(id)).collect();
    Json(products).into_response()
}

async fn get_profile(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    if let Err(r) = admit(&b, &headers, "GET /profile".into()) {
        return r;
    }
    let user = caller(&headers, "x-user-id");
    Json(json!({
        "id": user,
        "name": "Asha Patil",
        "email": "asha@freshcatch.in",
        "role": "user",
        "verified": true
    }))
    .into_response()
}

async fn get_cart(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    let user = caller(&headers, "x-user-id");
    match admit(&b, &headers, "GET /cart".into()) {
        Ok(state) => {
            let items = state.carts.get(&user).cloned().unwrap_or_default();
            Json(json!({ "items": items })).into_response()
        }
        Err(r) => r,
    }
}

async fn add_item(
    State(b): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = caller(&headers, "x-user-id");
    let mut state = match admit(&b, &headers, "POST /cart/items".into()) {
        Ok(state) => state,
        Err(r) => return r,
    };

    let product_id = body["product_id"].as_str().unwrap_or_default().to_string();
    let quantity = body["quantity"].as_u64().unwrap_or(1);
    let Some(product) = product(&product_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    state.next_id += 1;
    let new_id = format!("l{}", state.next_id);
    let lines = state.carts.entry(user).or_default();

    if let Some(line) = lines.iter_mut().find(|l| l["product_id"] == product_id.as_str()) {
        let merged = line["quantity"].as_u64().unwrap_or(0) + quantity;
        line["quantity"] = json!(merged);
        return Json(line.clone()).into_response();
    }

    let line = json!({
        "id": new_id,
        "product_id": product_id,
        "product": { "name": product["name"], "unit_price": product["price"] },
        "quantity": quantity
    });
    lines.push(line.clone());
    Json(line).into_response()
}

async fn update_item(
    State(b): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let user = caller(&headers, "x-user-id");
    let mut state = match admit(&b, &headers, format!("PATCH /cart/items/{id}")) {
        Ok(state) => state,
        Err(r) => return r,
    };
    let line = state
        .carts
        .get_mut(&user)
        .and_then(|lines| lines.iter_mut().find(|l| l["id"] == id.as_str()));
    match line {
        Some(line) => {
            line["quantity"] = body["quantity"].clone();
            Json(line.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove_item(
    State(b): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let user = caller(&headers, "x-user-id");
    let mut state = match admit(&b, &headers, format!("DELETE /cart/items/{id}")) {
        Ok(state) => state,
        Err(r) => return r,
    };
    if let Some(lines) = state.carts.get_mut(&user) {
        lines.retain(|l| l["id"] != id.as_str());
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn clear_cart(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    let user = caller(&headers, "x-user-id");
    let mut state = match admit(&b, &headers, "DELETE /cart".into()) {
        Ok(state) => state,
        Err(r) => return r,
    };
    if state.fail_cart_clear {
        return (StatusCode::SERVICE_UNAVAILABLE, "cart service down").into_response();
    }
    state.carts.remove(&user);
    StatusCode::NO_CONTENT.into_response()
}

async fn create_order(
    State(b): State<FakeBackend>,
    headers: HeaderMap,
    Json(submission): Json<Value>,
) -> Response {
    let user = caller(&headers, "x-user-id");
    let mut state = match admit(&b, &headers, "POST /orders".into()) {
        Ok(state) => state,
        Err(r) => return r,
    };
    state.next_id += 1;
    let order = json!({
        "id": format!("o{}", state.next_id),
        "owner": user,
        "status": "pending",
        "items": submission["items"],
        "delivery": submission["delivery"],
        "payment_method": submission["payment_method"],
        "total_amount": submission["total_amount"],
        "created_at": "2026-10-15T09:30:00Z"
    });
    state.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn list_orders(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    let user = caller(&headers, "x-user-id");
    match admit(&b, &headers, "GET /orders".into()) {
        Ok(state) => {
            let mine: Vec<Value> = state
                .orders
                .iter()
                .filter(|o| o["owner"] == user.as_str())
                .cloned()
                .collect();
            Json(mine).into_response()
        }
        Err(r) => r,
    }
}

async fn stats(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    match admit(&b, &headers, "GET /admin/stats".into()) {
        Ok(state) => {
            let pending = state
                .orders
                .iter()
                .filter(|o| o["status"] == "pending")
                .count();
            Json(json!({
                "total_orders": state.orders.len(),
                "pending_orders": pending,
                "revenue": "0",
                "total_users": 1,
                "total_products": CATALOGUE.len()
            }))
            .into_response()
        }
        Err(r) => r,
    }
}

async fn admin_orders(State(b): State<FakeBackend>, headers: HeaderMap) -> Response {
    match admit(&b, &headers, "GET /admin/orders".into()) {
        Ok(state) => Json(state.orders.clone()).into_response(),
        Err(r) => r,
    }
}

/// Enforces the delivery lifecycle; illegal moves get 409.
async fn update_status(
    State(b): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = match admit(&b, &headers, format!("PUT /admin/orders/{id}/status")) {
        Ok(state) => state,
        Err(r) => return r,
    };
    let Some(order) = state.orders.iter_mut().find(|o| o["id"] == id.as_str()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let current = order["status"].as_str().and_then(OrderStatus::from_wire);
    let requested = body["status"].as_str().and_then(OrderStatus::from_wire);
    match (current, requested) {
        (Some(from), Some(to)) if from.can_transition_to(to) => {
            order["status"] = json!(to.as_str());
            Json(order.clone()).into_response()
        }
        (Some(from), Some(to)) => (
            StatusCode::CONFLICT,
            Json(json!({ "message": format!("cannot move a {from} order to {to}") })),
        )
            .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}
