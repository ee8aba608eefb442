//! Regional address lookup (proxied, cached)

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};

use crate::region::{Region, RegionError, RegionLevel};
use crate::state::AppState;

use super::ApiResult;

async fn lookup(state: &AppState, level: RegionLevel, parent_id: Option<&str>) -> ApiResult<Vec<Region>> {
    match state.regions.list(level, parent_id).await {
        Ok(regions) => Ok(Json(regions.as_ref().clone())),
        Err(RegionError::InvalidId(id)) => Err(AppError::new(ErrorCode::InvalidFormat)
            .with_detail("id", id)
            .into()),
        Err(e) => {
            tracing::warn!(error = %e, "Region lookup failed");
            Err(AppError::upstream(ErrorCode::RegionLookupFailed, "region", e.to_string()).into())
        }
    }
}

/// GET /api/regions/provinces
pub async fn provinces(State(state): State<AppState>) -> ApiResult<Vec<Region>> {
    lookup(&state, RegionLevel::Provinces, None).await
}

/// GET /api/regions/regencies/{province_id}
pub async fn regencies(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Region>> {
    lookup(&state, RegionLevel::Regencies, Some(&id)).await
}

/// GET /api/regions/districts/{regency_id}
pub async fn districts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Region>> {
    lookup(&state, RegionLevel::Districts, Some(&id)).await
}

/// GET /api/regions/villages/{district_id}
pub async fn villages(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Region>> {
    lookup(&state, RegionLevel::Villages, Some(&id)).await
}
