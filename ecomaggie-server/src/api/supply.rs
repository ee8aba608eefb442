//! Waste pickup (supply) request endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use serde::Serialize;
use shared::models::{Address, Supply, SupplyAction, SupplyCreate, SupplyStatus, UserRole};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::services::supplies;
use crate::state::AppState;

use super::ApiResult;

// ── Producer ──

/// POST /api/supplies
pub async fn create_supply(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<SupplyCreate>,
) -> ApiResult<Supply> {
    if db::profiles::role_of(&state.pool, &identity.user_id).await? != Some(UserRole::Producer) {
        return Err(AppError::new(ErrorCode::ProducerRequired).into());
    }
    payload.validate()?;
    db::addresses::find(&state.pool, &identity.user_id, payload.pickup_address_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::AddressNotFound).with_detail("field", "pickup_address_id"))?;

    let supply =
        db::supplies::create(&state.pool, snowflake_id(), &identity.user_id, &payload, now_millis()).await?;
    tracing::info!(supply_id = supply.id, producer_id = %identity.user_id, "Supply request created");
    Ok(Json(supply))
}

/// GET /api/supplies
pub async fn list_supplies(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Supply>> {
    Ok(Json(
        db::supplies::list_for_producer(&state.pool, &identity.user_id).await?,
    ))
}

/// POST /api/supplies/{id}/cancel
pub async fn cancel_supply(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Supply> {
    act(&state, &identity, id, SupplyAction::Cancel).await
}

// ── Farmer ──

/// GET /api/farmer/supplies
pub async fn list_farmer_supplies(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Supply>> {
    Ok(Json(
        db::supplies::list_for_farmer(&state.pool, &identity.user_id).await?,
    ))
}

/// Supply with its pickup location
#[derive(Debug, Serialize)]
pub struct SupplyView {
    #[serde(flatten)]
    pub supply: Supply,
    pub pickup_address: Option<Address>,
}

/// GET /api/farmer/supplies/{id}: open requests, or ones this farmer handled
pub async fn get_farmer_supply(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<SupplyView> {
    let supply = db::supplies::find(&state.pool, id)
        .await?
        .filter(|s| s.status == SupplyStatus::Pending || s.farmer_id.as_deref() == Some(identity.user_id.as_str()))
        .ok_or_else(|| AppError::new(ErrorCode::SupplyNotFound))?;
    let pickup_address = db::addresses::find_by_id(&state.pool, supply.pickup_address_id).await?;
    Ok(Json(SupplyView {
        supply,
        pickup_address,
    }))
}

/// POST /api/farmer/supplies/{id}/accept
pub async fn accept_supply(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Supply> {
    act(&state, &identity, id, SupplyAction::Accept).await
}

/// POST /api/farmer/supplies/{id}/reject
pub async fn reject_supply(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Supply> {
    act(&state, &identity, id, SupplyAction::Reject).await
}

/// POST /api/farmer/supplies/{id}/complete
pub async fn complete_supply(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Supply> {
    act(&state, &identity, id, SupplyAction::Complete).await
}

async fn act(state: &AppState, identity: &UserIdentity, id: i64, action: SupplyAction) -> ApiResult<Supply> {
    let supply = supplies::apply(&state.pool, state.notifier.as_ref(), &identity.user_id, id, action).await?;
    Ok(Json(supply))
}
