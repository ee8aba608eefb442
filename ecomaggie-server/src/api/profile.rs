//! Profile endpoints

use axum::{Extension, Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{ProfileUpdate, UserProfile};
use shared::util::{normalize_phone, now_millis};

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<UserProfile> {
    let profile = db::profiles::find(&state.pool, &identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound))?;
    Ok(Json(profile))
}

/// PUT /api/profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<UserProfile> {
    if payload.full_name.trim().is_empty() {
        return Err(AppError::validation("Nama lengkap wajib diisi")
            .with_detail("field", "full_name")
            .into());
    }
    let phone = match payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Some(normalize_phone(raw).ok_or_else(|| {
            AppError::new(ErrorCode::InvalidPhoneNumber).with_detail("field", "phone")
        })?),
        None => None,
    };

    let profile =
        db::profiles::upsert(&state.pool, &identity.user_id, &payload, phone.as_deref(), now_millis()).await?;
    tracing::info!(user_id = %identity.user_id, role = profile.role.as_db(), "Profile saved");
    Ok(Json(profile))
}
