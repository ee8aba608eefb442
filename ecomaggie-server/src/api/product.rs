//! Product catalog and farmer product management

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::ApiResult;

// ── Public catalog ──

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Vec<Product>> {
    Ok(Json(db::products::list_active(&state.pool, &query).await?))
}

/// GET /api/products/{id}
pub async fn get_product(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Product> {
    let product = db::products::find_active(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}

// ── Farmer ──

/// GET /api/farmer/products
pub async fn list_own_products(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Product>> {
    Ok(Json(db::products::list_by_farmer(&state.pool, &identity.user_id).await?))
}

/// POST /api/farmer/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<ProductCreate>,
) -> ApiResult<Product> {
    payload.validate()?;
    let product =
        db::products::create(&state.pool, snowflake_id(), &identity.user_id, &payload, now_millis()).await?;
    tracing::info!(product_id = product.id, farmer_id = %identity.user_id, "Product created");
    Ok(Json(product))
}

/// PUT /api/farmer/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    payload.validate()?;
    let product = db::products::update(&state.pool, &identity.user_id, id, &payload, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}

/// POST /api/farmer/products/{id}/deactivate
pub async fn deactivate_product(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    if !db::products::deactivate(&state.pool, &identity.user_id, id, now_millis()).await? {
        return Err(AppError::new(ErrorCode::ProductNotFound).into());
    }
    let product = db::products::find(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    tracing::info!(product_id = id, "Product deactivated");
    Ok(Json(product))
}
