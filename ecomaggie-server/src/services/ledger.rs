//! PostgreSQL-backed order ledger

use async_trait::async_trait;
use shared::models::{Order, OrderStatus};
use shared::util::now_millis;
use sqlx::PgPool;

use super::reconcile::{OrderLedger, OrderSnapshot, TrackingUpdate, TransitionEffect};
use crate::db;
use crate::error::BoxError;

impl From<Order> for OrderSnapshot {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            buyer_id: o.buyer_id,
            farmer_id: o.farmer_id,
            status: o.status,
            total: o.total,
            courier: o.courier,
            waybill_id: o.waybill_id,
        }
    }
}

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLedger for PgLedger {
    async fn record_event(&self, event_key: &str, source: &str) -> Result<bool, BoxError> {
        Ok(db::webhook_events::record(&self.pool, event_key, source, now_millis()).await?)
    }

    async fn forget_event(&self, event_key: &str) -> Result<(), BoxError> {
        Ok(db::webhook_events::forget(&self.pool, event_key).await?)
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<OrderSnapshot>, BoxError> {
        let order = db::orders::find_by_number(&self.pool, order_number).await?;
        Ok(order.map(Into::into))
    }

    async fn find_by_courier_order(
        &self,
        courier_order_id: &str,
        waybill_id: Option<&str>,
    ) -> Result<Option<OrderSnapshot>, BoxError> {
        let order = db::orders::find_by_courier_order(&self.pool, courier_order_id, waybill_id).await?;
        Ok(order.map(Into::into))
    }

    async fn transition(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        effect: &TransitionEffect,
    ) -> Result<bool, BoxError> {
        Ok(db::orders::transition(&self.pool, order_id, from, to, effect, now_millis()).await?)
    }

    async fn update_tracking(&self, order_id: i64, update: &TrackingUpdate) -> Result<(), BoxError> {
        Ok(db::shipments::upsert_tracking(&self.pool, order_id, update, now_millis()).await?)
    }

    async fn phone_of(&self, user_id: &str) -> Result<Option<String>, BoxError> {
        Ok(db::profiles::phone_of(&self.pool, user_id).await?)
    }
}
