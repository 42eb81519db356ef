//! User management route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use freshcatch_core::{UserId, UserProfile, ValidationErrors};
use tracing::instrument;

use crate::api::types::UserUpdate;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<UserProfile>>> {
    let users = state.api().list_users(&admin.user_id).await?;
    Ok(Json(users))
}

/// Change a user's role or verification flag.
///
/// Admins cannot demote themselves, so the back-office always keeps at least
/// the acting admin.
#[instrument(skip_all, fields(admin_id = %admin.user_id, user_id = %user_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserProfile>> {
    check_update(&admin.user_id, &user_id, &update)?;

    let user = state
        .api()
        .update_user(&admin.user_id, &user_id, &update)
        .await?;

    tracing::info!(role = %user.role, verified = user.verified, "User updated");
    Ok(Json(user))
}

fn check_update(
    admin_id: &UserId,
    user_id: &UserId,
    update: &UserUpdate,
) -> std::result::Result<(), ValidationErrors> {
    if update.is_empty() {
        return Err(ValidationErrors::single("role", "nothing to update"));
    }
    if admin_id == user_id && update.role.is_some_and(|r| r != freshcatch_core::Role::Admin) {
        return Err(ValidationErrors::single("role", "you cannot remove your own admin role"));
    }
    Ok(())
}
