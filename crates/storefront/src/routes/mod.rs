//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Health check
//!
//! # Catalogue (public)
//! GET    /api/products            - Product listing (?category=)
//! GET    /api/products/{id}       - Product detail
//!
//! # Cart (requires sign-in)
//! GET    /api/cart                - Cart with totals (?refresh=true)
//! POST   /api/cart/items          - Add a product
//! PATCH  /api/cart/items/{id}     - Change quantity (0 removes)
//! DELETE /api/cart/items/{id}     - Remove a line
//! DELETE /api/cart?confirm=true   - Empty the cart
//!
//! # Checkout (requires sign-in)
//! GET    /api/checkout            - Summary and pre-filled form
//! POST   /api/checkout            - Place the order
//!
//! # Account (requires sign-in)
//! GET    /api/orders              - Order history with status badges
//! GET    /api/orders/{id}         - Order detail
//! GET    /api/profile             - Profile
//! PUT    /api/profile             - Update name, phone, address
//! ```

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", get(checkout::show).post(checkout::submit))
}

/// Create the order history routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .route("/profile", get(profile::show).put(profile::update));

    Router::new().nest("/api", api)
}
