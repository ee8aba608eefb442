//! Address book endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Address, AddressInput};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Address>> {
    Ok(Json(db::addresses::list(&state.pool, &identity.user_id).await?))
}

/// POST /api/addresses
pub async fn create_address(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<AddressInput>,
) -> ApiResult<Address> {
    payload.validate()?;
    let address =
        db::addresses::create(&state.pool, snowflake_id(), &identity.user_id, &payload, now_millis()).await?;
    Ok(Json(address))
}

/// PUT /api/addresses/{id}
pub async fn update_address(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<AddressInput>,
) -> ApiResult<Address> {
    payload.validate()?;
    let address = db::addresses::update(&state.pool, &identity.user_id, id, &payload)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::AddressNotFound))?;
    Ok(Json(address))
}

/// POST /api/addresses/{id}/default
pub async fn set_default_address(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Address>> {
    if !db::addresses::set_default(&state.pool, &identity.user_id, id).await? {
        return Err(AppError::new(ErrorCode::AddressNotFound).into());
    }
    Ok(Json(db::addresses::list(&state.pool, &identity.user_id).await?))
}
