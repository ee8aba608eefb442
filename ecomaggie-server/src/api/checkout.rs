//! Checkout endpoint

use axum::{Extension, Json, extract::State};
use shared::models::{CheckoutRequest, CheckoutResponse};

use crate::auth::UserIdentity;
use crate::services::checkout;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/checkout
pub async fn checkout(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    let response = checkout::checkout(&state, &identity.user_id, &payload).await?;
    Ok(Json(response))
}
