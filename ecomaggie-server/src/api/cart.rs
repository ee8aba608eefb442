//! Shopping cart endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{AddCartItem, CartSummary, UpdateCartItem, clamp_quantity};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::ApiResult;

async fn summary(state: &AppState, user_id: &str) -> ApiResult<CartSummary> {
    let lines = db::carts::list(&state.pool, user_id).await?;
    Ok(Json(CartSummary::new(lines)))
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<CartSummary> {
    summary(&state, &identity.user_id).await
}

/// POST /api/cart/items: add or increment, capped at stock
pub async fn add_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<AddCartItem>,
) -> ApiResult<CartSummary> {
    if payload.quantity <= 0 {
        return Err(AppError::new(ErrorCode::ValueOutOfRange)
            .with_detail("field", "quantity")
            .into());
    }
    let product = db::products::find_active(&state.pool, payload.product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    if product.farmer_id == identity.user_id {
        return Err(AppError::invalid_request("Tidak dapat membeli produk sendiri").into());
    }

    let current = db::carts::quantity_of(&state.pool, &identity.user_id, product.id).await?;
    let quantity = clamp_quantity(current.saturating_add(payload.quantity), product.stock)
        .ok_or_else(|| AppError::new(ErrorCode::ProductOutOfStock).with_detail("product_id", product.id))?;

    db::carts::upsert(
        &state.pool,
        snowflake_id(),
        &identity.user_id,
        product.id,
        quantity,
        now_millis(),
    )
    .await?;
    summary(&state, &identity.user_id).await
}

/// PATCH /api/cart/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCartItem>,
) -> ApiResult<CartSummary> {
    let line = db::carts::find_line(&state.pool, &identity.user_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;

    // zero removes the line
    if payload.quantity <= 0 {
        db::carts::remove(&state.pool, &identity.user_id, id).await?;
        return summary(&state, &identity.user_id).await;
    }
    let quantity = clamp_quantity(payload.quantity, line.stock).ok_or_else(|| {
        AppError::new(ErrorCode::ProductOutOfStock).with_detail("product_id", line.product_id)
    })?;
    db::carts::set_quantity(&state.pool, &identity.user_id, id, quantity).await?;
    summary(&state, &identity.user_id).await
}

/// DELETE /api/cart/items/{id}
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<CartSummary> {
    if !db::carts::remove(&state.pool, &identity.user_id, id).await? {
        return Err(AppError::new(ErrorCode::CartItemNotFound).into());
    }
    summary(&state, &identity.user_id).await
}
