//! Buyer and farmer order actions

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus, ShipOrderRequest};
use shared::util::now_millis;
use sqlx::PgPool;

use super::ledger::PgLedger;
use super::reconcile::{self, OrderSnapshot, TrackingUpdate, TransitionEffect};
use crate::db;
use crate::error::ServiceResult;
use crate::notify::Notifier;
use crate::payment::MidtransClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Buyer,
    Farmer,
}

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Buyer: unpaid order. Farmer: paid order not yet shipped.
    Cancel,
    /// Buyer confirms receipt
    Complete,
    /// Farmer hands the parcel to a courier
    Ship(ShipOrderRequest),
}

impl OrderAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Ship(_) => "ship",
        }
    }
}

/// Target status for `action` by `actor` on an order in `current`
pub fn check_action(actor: Actor, action: &OrderAction, current: OrderStatus) -> Result<OrderStatus, AppError> {
    let target = match (actor, action) {
        (Actor::Buyer, OrderAction::Cancel) => {
            if current == OrderStatus::Packed {
                return Err(AppError::new(ErrorCode::OrderAlreadyPaid));
            }
            OrderStatus::Cancelled
        }
        (Actor::Buyer, OrderAction::Complete) => OrderStatus::Completed,
        (Actor::Farmer, OrderAction::Ship(_)) => OrderStatus::Shipped,
        (Actor::Farmer, OrderAction::Cancel) => {
            if current == OrderStatus::Unpaid {
                return Err(AppError::order_transition(current.as_db(), action.name()));
            }
            OrderStatus::Cancelled
        }
        _ => return Err(AppError::permission_denied("Aksi tidak diizinkan untuk peran ini")),
    };

    match current {
        OrderStatus::Completed => Err(AppError::new(ErrorCode::OrderAlreadyCompleted)),
        OrderStatus::Cancelled => Err(AppError::new(ErrorCode::OrderAlreadyCancelled)),
        _ if current.can_transition_to(target) => Ok(target),
        _ => Err(AppError::order_transition(current.as_db(), action.name())),
    }
}

/// Stop the gateway from accepting payment for an order the buyer cancelled.
///
/// Failures are logged; a payment that still arrives is flagged by reconciliation.
pub async fn void_payment(gateway: &MidtransClient, order: &Order) {
    if order.payment_token.is_none() {
        return;
    }
    match gateway.cancel_transaction(&order.order_number).await {
        Ok(()) => tracing::info!(order_number = %order.order_number, "Payment transaction cancelled"),
        Err(e) => tracing::warn!(
            error = %e,
            order_number = %order.order_number,
            "Failed to cancel payment transaction"
        ),
    }
}

/// Apply a manual order action and send the resulting notifications
pub async fn apply(
    pool: &PgPool,
    notifier: &dyn Notifier,
    actor: Actor,
    user_id: &str,
    order_id: i64,
    action: OrderAction,
) -> ServiceResult<Order> {
    let order = match actor {
        Actor::Buyer => db::orders::find_for_buyer(pool, user_id, order_id).await?,
        Actor::Farmer => db::orders::find_for_farmer(pool, user_id, order_id).await?,
    }
    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if let OrderAction::Ship(req) = &action {
        req.validate()?;
    }
    let target = check_action(actor, &action, order.status)?;

    let effect = match &action {
        OrderAction::Ship(req) => TransitionEffect::Shipped {
            courier: Some(req.courier.trim().to_lowercase()),
            waybill_id: Some(req.waybill_id.trim().to_string()),
        },
        _ => TransitionEffect::None,
    };

    let now = now_millis();
    if !db::orders::transition(pool, order.id, order.status, target, &effect, now).await? {
        // lost a race with a webhook or the other party
        return Err(AppError::order_transition(order.status.as_db(), action.name()).into());
    }

    if let OrderAction::Ship(req) = &action
        && let Some(booking) = req.courier_order_id.as_deref().filter(|b| !b.is_empty())
    {
        let update = TrackingUpdate {
            courier_order_id: booking.to_string(),
            courier_company: Some(req.courier.trim().to_lowercase()),
            waybill_id: Some(req.waybill_id.trim().to_string()),
            status: None,
            price: None,
        };
        db::shipments::upsert_tracking(pool, order.id, &update, now).await?;
    }

    tracing::info!(
        order_number = %order.order_number,
        from = %order.status,
        to = %target,
        actor = ?actor,
        "Order status updated"
    );

    let updated = match actor {
        Actor::Buyer => db::orders::find_for_buyer(pool, user_id, order_id).await?,
        Actor::Farmer => db::orders::find_for_farmer(pool, user_id, order_id).await?,
    }
    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    // the buyer does not need a message about their own cancellation
    if !(actor == Actor::Buyer && target == OrderStatus::Cancelled) {
        let ledger = PgLedger::new(pool.clone());
        let reason = match actor {
            Actor::Buyer => "dibatalkan oleh pembeli",
            Actor::Farmer => "dibatalkan oleh peternak",
        };
        let snapshot: OrderSnapshot = updated.clone().into();
        reconcile::notify_transition(&ledger, notifier, &snapshot, target, reason).await;
    }

    Ok(updated)
}
