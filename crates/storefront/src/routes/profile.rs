//! Profile route handlers.
//!
//! City and state are not editable: every address is pinned to the service
//! area.

use axum::{Json, extract::State};
use freshcatch_core::{Address, Phone, Pincode, ServiceArea, UserProfile, ValidationErrors};
use serde::Deserialize;
use tracing::instrument;

use crate::api::types::ProfileUpdate;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 80;

/// `PUT /api/profile` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub pincode: String,
    pub landmark: Option<String>,
}

impl ProfileForm {
    /// Check every field. Phone and address are optional, but an address
    /// needs both street and pincode.
    fn validate(&self, area: &ServiceArea) -> std::result::Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "name is required");
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.add("name", format!("name must be at most {MAX_NAME_LEN} characters"));
        }

        let phone = if self.phone.trim().is_empty() {
            None
        } else {
            errors.check("phone", Phone::parse(&self.phone))
        };

        let street = self.street.trim();
        let pincode = self.pincode.trim();
        let address = match (street.is_empty(), pincode.is_empty()) {
            (true, true) => None,
            (true, false) => {
                errors.add("street", "street address is required with a pincode");
                None
            }
            (false, _) => errors
                .check("pincode", Pincode::parse(pincode))
                .map(|pincode| Address::within(area, street, pincode, self.landmark.clone())),
        };

        errors.into_result(ProfileUpdate {
            name: name.to_string(),
            phone,
            address,
        })
    }
}

/// The shopper's profile.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.api().get_profile(&user.user_id).await?))
}

/// Update name, phone and address.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<UserProfile>> {
    let update = form.validate(state.service_area())?;
    let profile = state.api().update_profile(&user.user_id, &update).await?;
    Ok(Json(profile))
}
