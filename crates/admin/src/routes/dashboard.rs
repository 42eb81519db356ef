//! Dashboard route handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::api::types::DashboardStats;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Dashboard counters plus the revenue formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub revenue_display: String,
}

impl From<DashboardStats> for DashboardView {
    fn from(stats: DashboardStats) -> Self {
        Self {
            revenue_display: stats.revenue.display(),
            stats,
        }
    }
}

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<DashboardView>> {
    let stats = state.api().dashboard_stats(&admin.user_id).await?;
    Ok(Json(stats.into()))
}
