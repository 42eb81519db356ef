//! Product management route handlers.
//!
//! Drafts are validated here before anything is sent to the backend.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use freshcatch_core::{Product, ProductDraft, ProductId};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.api().list_products(&admin.user_id).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id, product_id = %product_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(
        state.api().get_product(&admin.user_id, &product_id).await?,
    ))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let draft = draft.validate()?;
    let product = state.api().create_product(&admin.user_id, &draft).await?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id, product_id = %product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(product_id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    let draft = draft.validate()?;
    let product = state
        .api()
        .update_product(&admin.user_id, &product_id, &draft)
        .await?;
    Ok(Json(product))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id, product_id = %product_id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    state
        .api()
        .delete_product(&admin.user_id, &product_id)
        .await?;

    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
