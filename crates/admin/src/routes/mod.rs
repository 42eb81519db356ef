//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Health check
//!
//! # Everything below requires an admin token
//! GET    /api/dashboard                   - Store counters
//!
//! GET    /api/users                       - All users
//! PATCH  /api/users/{id}                  - Change role / verified flag
//!
//! GET    /api/products                    - All products
//! POST   /api/products                    - Create product
//! GET    /api/products/{id}               - Product detail
//! PUT    /api/products/{id}               - Replace product
//! DELETE /api/products/{id}               - Delete product
//!
//! GET    /api/orders                      - All orders (?status=)
//! GET    /api/orders/status-options       - Every status with its badge
//! GET    /api/orders/{id}                 - Order detail
//! PUT    /api/orders/{id}/status          - Change status (409 if refused)
//! ```

pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, put},
};

use crate::state::AppState;

/// Create the user management routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", patch(users::update))
}

/// Create the product management routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order management routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/status-options", get(orders::status_options))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/dashboard", get(dashboard::show))
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes());

    Router::new().nest("/api", api)
}
