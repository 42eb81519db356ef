//! Catalogue route handlers. Public, no sign-in required.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use freshcatch_core::{Product, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// `GET /api/products` query.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// List products, optionally by category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let products = state.api().list_products(category).await?;
    Ok(Json(Vec::clone(&products)))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.api().get_product(&product_id).await?))
}
