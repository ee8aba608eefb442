//! Farmer dashboard

use axum::{Extension, Json, extract::State};
use shared::util::now_millis;

use crate::auth::UserIdentity;
use crate::db::dashboard::{self, FarmerDashboard};
use crate::state::AppState;

use super::ApiResult;

/// GET /api/farmer/dashboard
pub async fn farmer_dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<FarmerDashboard> {
    let month_start = dashboard::month_start(now_millis());
    Ok(Json(
        dashboard::farmer(&state.pool, &identity.user_id, month_start).await?,
    ))
}
