//! Buyer and farmer order endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderDetail, OrderStatus, ShipOrderRequest};

use crate::auth::UserIdentity;
use crate::db;
use crate::db::shipments::Shipment;
use crate::services::orders::{self, Actor, OrderAction};
use crate::state::AppState;

use super::ApiResult;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

/// Order detail with courier tracking
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub detail: OrderDetail,
    pub shipment: Option<Shipment>,
}

async fn view(state: &AppState, order: Order) -> ApiResult<OrderView> {
    let items = db::orders::items(&state.pool, order.id).await?;
    let shipment = db::shipments::find(&state.pool, order.id).await?;
    Ok(Json(OrderView {
        detail: OrderDetail { order, items },
        shipment,
    }))
}

// ── Buyer ──

/// GET /api/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<Order>> {
    Ok(Json(
        db::orders::list_for_buyer(&state.pool, &identity.user_id, query.status).await?,
    ))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<OrderView> {
    let order = db::orders::find_for_buyer(&state.pool, &identity.user_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    view(&state, order).await
}

/// POST /api/orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = orders::apply(
        &state.pool,
        state.notifier.as_ref(),
        Actor::Buyer,
        &identity.user_id,
        id,
        OrderAction::Cancel,
    )
    .await?;
    orders::void_payment(&state.midtrans, &order).await;
    Ok(Json(order))
}

/// POST /api/orders/{id}/complete
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = orders::apply(
        &state.pool,
        state.notifier.as_ref(),
        Actor::Buyer,
        &identity.user_id,
        id,
        OrderAction::Complete,
    )
    .await?;
    Ok(Json(order))
}

// ── Farmer ──

/// GET /api/farmer/orders
pub async fn list_farmer_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<Order>> {
    Ok(Json(
        db::orders::list_for_farmer(&state.pool, &identity.user_id, query.status).await?,
    ))
}

/// GET /api/farmer/orders/{id}
pub async fn get_farmer_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<OrderView> {
    let order = db::orders::find_for_farmer(&state.pool, &identity.user_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    view(&state, order).await
}

/// POST /api/farmer/orders/{id}/ship
pub async fn ship_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<ShipOrderRequest>,
) -> ApiResult<Order> {
    let order = orders::apply(
        &state.pool,
        state.notifier.as_ref(),
        Actor::Farmer,
        &identity.user_id,
        id,
        OrderAction::Ship(payload),
    )
    .await?;
    Ok(Json(order))
}

/// POST /api/farmer/orders/{id}/cancel
pub async fn cancel_farmer_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = orders::apply(
        &state.pool,
        state.notifier.as_ref(),
        Actor::Farmer,
        &identity.user_id,
        id,
        OrderAction::Cancel,
    )
    .await?;
    Ok(Json(order))
}
