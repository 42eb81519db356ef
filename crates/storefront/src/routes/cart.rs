//! Cart route handlers.
//!
//! Every response carries the whole cart so the client never has to derive
//! totals itself.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use freshcatch_core::{Cart, CartItem, CartItemId, Price, ProductId, ValidationErrors};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Cart as returned by every cart route.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_amount: Price,
    pub total_display: String,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total_amount = cart.total_amount();
        Self {
            item_count: cart.item_count(),
            total_display: total_amount.display(),
            total_amount,
            items: cart.items,
        }
    }
}

/// `GET /api/cart` query.
#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    /// Re-read the cart from the backend first.
    #[serde(default)]
    pub refresh: bool,
}

/// `POST /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// `PATCH /api/cart/items/{id}` body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    pub quantity: u32,
}

/// `DELETE /api/cart` query.
#[derive(Debug, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Show the cart.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<ShowQuery>,
) -> Result<Json<CartView>> {
    let store = state.carts().store(&user.user_id).await?;
    let cart = if query.refresh {
        store.refresh().await?
    } else {
        store.snapshot()
    };
    Ok(Json(cart.into()))
}

/// Add a product to the cart.
#[instrument(skip_all, fields(user_id = %user.user_id, product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItemBody>,
) -> Result<Json<CartView>> {
    let store = state.carts().store(&user.user_id).await?;
    let cart = store.add_item(&body.product_id, body.quantity).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", body.product_id.as_str())]),
    );

    Ok(Json(cart.into()))
}

/// Change a line's quantity; zero removes it.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<CartView>> {
    let store = state.carts().store(&user.user_id).await?;
    let cart = store.update_quantity(&item_id, body.quantity).await?;
    Ok(Json(cart.into()))
}

/// Remove a line. Removing a missing line is not an error.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    let store = state.carts().store(&user.user_id).await?;
    let cart = store.remove_item(&item_id).await?;
    Ok(Json(cart.into()))
}

/// Empty the cart. Requires `?confirm=true`.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<ClearQuery>,
) -> Result<Json<CartView>> {
    if !query.confirm {
        return Err(ValidationErrors::single(
            "confirm",
            "clearing the cart must be confirmed with confirm=true",
        )
        .into());
    }

    let store = state.carts().store(&user.user_id).await?;
    let cart = store.clear_cart().await?;
    Ok(Json(cart.into()))
}
