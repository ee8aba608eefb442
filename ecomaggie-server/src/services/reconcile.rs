//! Order status reconciliation from payment and courier webhooks
//!
//! Idempotency has two layers:
//! 1. the event key is recorded before anything else; a duplicate delivery stops there
//! 2. status changes are compare-and-set, and notifications only follow a row that changed

use async_trait::async_trait;
use shared::models::OrderStatus;

pub use crate::db::orders::TransitionEffect;
pub use crate::db::shipments::TrackingUpdate;
use crate::error::BoxError;
use crate::notify::{self, Notifier, templates};
use crate::payment::{self, PaymentNotification};
use crate::shipping::{self, CourierEffect, CourierEvent, CourierEventKind};

/// The parts of an order reconciliation needs
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub id: i64,
    pub order_number: String,
    pub buyer_id: String,
    pub farmer_id: String,
    pub status: OrderStatus,
    pub total: i64,
    pub courier: Option<String>,
    pub waybill_id: Option<String>,
}

/// Persistence seam for reconciliation
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Record a webhook delivery. `false` when the key was already recorded.
    async fn record_event(&self, event_key: &str, source: &str) -> Result<bool, BoxError>;

    /// Remove a recorded delivery so a retry can be processed
    async fn forget_event(&self, event_key: &str) -> Result<(), BoxError>;

    async fn find_by_number(&self, order_number: &str) -> Result<Option<OrderSnapshot>, BoxError>;

    /// Look up by courier order id, falling back to the waybill number
    async fn find_by_courier_order(
        &self,
        courier_order_id: &str,
        waybill_id: Option<&str>,
    ) -> Result<Option<OrderSnapshot>, BoxError>;

    /// Compare-and-set `from -> to`. `false` when the order was no longer in `from`.
    async fn transition(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        effect: &TransitionEffect,
    ) -> Result<bool, BoxError>;

    async fn update_tracking(&self, order_id: i64, update: &TrackingUpdate) -> Result<(), BoxError>;

    /// WhatsApp number on the user's profile
    async fn phone_of(&self, user_id: &str) -> Result<Option<String>, BoxError>;
}

/// Result of processing one webhook delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Order moved to this status
    StatusChanged(OrderStatus),
    /// Shipment tracking stored, order status unchanged
    TrackingUpdated,
    /// Valid delivery that does not apply to the order's current status
    NoChange,
    /// Money arrived for an order that was already cancelled; needs a manual refund
    PaidAfterCancel,
    /// Event key already processed
    Duplicate,
    /// Unknown status or event, logged
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("ledger error: {0}")]
    Store(BoxError),
}

/// Apply a verified payment notification
pub async fn reconcile_payment(
    ledger: &dyn OrderLedger,
    notifier: &dyn Notifier,
    notification: &PaymentNotification,
) -> Result<Outcome, ReconcileError> {
    let order = ledger
        .find_by_number(&notification.order_id)
        .await
        .map_err(ReconcileError::Store)?
        .ok_or_else(|| ReconcileError::OrderNotFound(notification.order_id.clone()))?;

    let target = match payment::map_transaction_status(
        &notification.transaction_status,
        notification.fraud_status.as_deref(),
    ) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, order_number = %order.order_number, "Ignoring payment notification");
            return Ok(Outcome::Ignored);
        }
    };

    if target == OrderStatus::Packed && notification.gross_amount_rupiah() != Some(order.total) {
        tracing::warn!(
            order_number = %order.order_number,
            gross_amount = %notification.gross_amount,
            total = order.total,
            "Payment amount does not match order total, ignoring"
        );
        return Ok(Outcome::Ignored);
    }

    let event_key = notification.event_key();
    if !ledger
        .record_event(&event_key, "payment")
        .await
        .map_err(ReconcileError::Store)?
    {
        tracing::info!(event_key = %event_key, "Duplicate payment notification, skipping");
        return Ok(Outcome::Duplicate);
    }

    if order.status == OrderStatus::Cancelled && target == OrderStatus::Packed {
        tracing::warn!(
            order_number = %order.order_number,
            transaction_id = %notification.transaction_id,
            gross_amount = %notification.gross_amount,
            "Payment settled for a cancelled order, refund required"
        );
        let buyer = phone(ledger, &order.buyer_id).await;
        notify::dispatch(
            notifier,
            buyer.as_deref(),
            &templates::paid_after_cancel(&order.order_number, order.total),
        )
        .await;
        return Ok(Outcome::PaidAfterCancel);
    }

    if !payment::payment_applies(order.status, target) {
        tracing::debug!(
            order_number = %order.order_number,
            current = %order.status,
            target = %target,
            "Payment notification does not change order"
        );
        return Ok(Outcome::NoChange);
    }

    let effect = match target {
        OrderStatus::Packed => TransitionEffect::Paid {
            payment_method: notification.payment_type.clone(),
        },
        _ => TransitionEffect::None,
    };

    let changed = match ledger.transition(order.id, order.status, target, &effect).await {
        Ok(changed) => changed,
        Err(e) => {
            release_event(ledger, &event_key).await;
            return Err(ReconcileError::Store(e));
        }
    };
    if !changed {
        return Ok(Outcome::NoChange);
    }

    tracing::info!(
        order_number = %order.order_number,
        from = %order.status,
        to = %target,
        transaction_status = %notification.transaction_status,
        "Order status updated from payment"
    );

    let reason = cancel_reason_for_payment(&notification.transaction_status);
    notify_transition(ledger, notifier, &order, target, reason).await;
    Ok(Outcome::StatusChanged(target))
}

/// Apply a verified courier callback
pub async fn reconcile_courier(
    ledger: &dyn OrderLedger,
    notifier: &dyn Notifier,
    event: &CourierEvent,
) -> Result<Outcome, ReconcileError> {
    let order = ledger
        .find_by_courier_order(&event.order_id, event.courier_waybill_id.as_deref())
        .await
        .map_err(ReconcileError::Store)?
        .ok_or_else(|| ReconcileError::OrderNotFound(event.order_id.clone()))?;

    let kind = event.kind();
    if kind == CourierEventKind::Unknown {
        tracing::warn!(event = %event.event, "Unknown courier event, ignoring");
        return Ok(Outcome::Ignored);
    }

    let effect = match (kind, event.status.as_deref()) {
        (CourierEventKind::Status, None) => {
            tracing::warn!(order_id = %event.order_id, "Courier status event without status");
            return Ok(Outcome::Ignored);
        }
        (CourierEventKind::Status, Some(status)) => match shipping::map_courier_status(status) {
            Some(effect) => effect,
            None => {
                tracing::warn!(status = status, order_id = %event.order_id, "Unknown courier status, ignoring");
                return Ok(Outcome::Ignored);
            }
        },
        _ => CourierEffect::TrackingOnly,
    };

    let event_key = event.event_key();
    if !ledger
        .record_event(&event_key, "shipping")
        .await
        .map_err(ReconcileError::Store)?
    {
        tracing::info!(event_key = %event_key, "Duplicate courier event, skipping");
        return Ok(Outcome::Duplicate);
    }

    let result = apply_courier(ledger, &order, event, effect).await;
    match result {
        Ok(Outcome::StatusChanged(target)) => {
            let waybill = event.courier_waybill_id.clone().or(order.waybill_id.clone());
            let courier = event.courier_company.clone().or(order.courier.clone());
            let order = OrderSnapshot {
                courier,
                waybill_id: waybill,
                ..order
            };
            notify_transition(ledger, notifier, &order, target, "dibatalkan oleh kurir").await;
            Ok(Outcome::StatusChanged(target))
        }
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            release_event(ledger, &event_key).await;
            Err(ReconcileError::Store(e))
        }
    }
}

async fn apply_courier(
    ledger: &dyn OrderLedger,
    order: &OrderSnapshot,
    event: &CourierEvent,
    effect: CourierEffect,
) -> Result<Outcome, BoxError> {
    let update = TrackingUpdate {
        courier_order_id: event.order_id.clone(),
        courier_company: event.courier_company.clone(),
        waybill_id: event.courier_waybill_id.clone(),
        status: event.status.clone(),
        price: event.price,
    };
    ledger.update_tracking(order.id, &update).await?;

    let target = match effect {
        CourierEffect::TrackingOnly => return Ok(Outcome::TrackingUpdated),
        CourierEffect::Order(target) => target,
    };
    if !shipping::courier_applies(order.status, target) {
        tracing::debug!(
            order_number = %order.order_number,
            current = %order.status,
            target = %target,
            "Courier update does not move order"
        );
        return Ok(Outcome::TrackingUpdated);
    }

    let transition_effect = match target {
        OrderStatus::Shipped => TransitionEffect::Shipped {
            courier: event.courier_company.clone(),
            waybill_id: event.courier_waybill_id.clone(),
        },
        _ => TransitionEffect::None,
    };
    if !ledger
        .transition(order.id, order.status, target, &transition_effect)
        .await?
    {
        return Ok(Outcome::TrackingUpdated);
    }

    tracing::info!(
        order_number = %order.order_number,
        from = %order.status,
        to = %target,
        "Order status updated from courier"
    );
    Ok(Outcome::StatusChanged(target))
}

async fn release_event(ledger: &dyn OrderLedger, event_key: &str) {
    if let Err(e) = ledger.forget_event(event_key).await {
        tracing::error!(error = %e, event_key = event_key, "Failed to release webhook event after error");
    }
}

fn cancel_reason_for_payment(transaction_status: &str) -> &'static str {
    match transaction_status {
        "expire" => "batas waktu pembayaran habis",
        "refund" | "partial_refund" => "dana dikembalikan",
        "cancel" => "pembayaran dibatalkan",
        _ => "pembayaran ditolak",
    }
}

/// Send the messages that belong to an order entering `to`
pub async fn notify_transition(
    ledger: &dyn OrderLedger,
    notifier: &dyn Notifier,
    order: &OrderSnapshot,
    to: OrderStatus,
    cancel_reason: &str,
) {
    match to {
        OrderStatus::Packed => {
            let buyer = phone(ledger, &order.buyer_id).await;
            notify::dispatch(
                notifier,
                buyer.as_deref(),
                &templates::payment_confirmed(&order.order_number, order.total),
            )
            .await;
            let farmer = phone(ledger, &order.farmer_id).await;
            notify::dispatch(
                notifier,
                farmer.as_deref(),
                &templates::new_paid_order(&order.order_number, order.total),
            )
            .await;
        }
        OrderStatus::Shipped => {
            let buyer = phone(ledger, &order.buyer_id).await;
            notify::dispatch(
                notifier,
                buyer.as_deref(),
                &templates::order_shipped(
                    &order.order_number,
                    order.courier.as_deref(),
                    order.waybill_id.as_deref(),
                ),
            )
            .await;
        }
        OrderStatus::Completed => {
            let farmer = phone(ledger, &order.farmer_id).await;
            notify::dispatch(
                notifier,
                farmer.as_deref(),
                &templates::order_completed(&order.order_number),
            )
            .await;
        }
        OrderStatus::Cancelled => {
            let buyer = phone(ledger, &order.buyer_id).await;
            notify::dispatch(
                notifier,
                buyer.as_deref(),
                &templates::order_cancelled(&order.order_number, cancel_reason),
            )
            .await;
        }
        OrderStatus::Unpaid => {}
    }
}

async fn phone(ledger: &dyn OrderLedger, user_id: &str) -> Option<String> {
    match ledger.phone_of(user_id).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, user_id = user_id, "Failed to load phone for notification");
            None
        }
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory ledger

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    pub struct MemoryLedger {
        pub orders: Mutex<HashMap<i64, OrderSnapshot>>,
        pub courier_ids: Mutex<HashMap<String, i64>>,
        pub events: Mutex<HashSet<String>>,
        pub phones: Mutex<HashMap<String, String>>,
        pub tracking: Mutex<Vec<(i64, TrackingUpdate)>>,
        pub effects: Mutex<Vec<(i64, TransitionEffect)>>,
        pub fail_transition: AtomicBool,
    }

    impl MemoryLedger {
        pub fn with_order(status: OrderStatus) -> Self {
            let ledger = Self::default();
            ledger.orders.lock().unwrap().insert(
                1,
                OrderSnapshot {
                    id: 1,
                    order_number: "ECO-20261018-1".into(),
                    buyer_id: "buyer".into(),
                    farmer_id: "farmer".into(),
                    status,
                    total: 82_500,
                    courier: None,
                    waybill_id: None,
                },
            );
            ledger.courier_ids.lock().unwrap().insert("bs-1".into(), 1);
            let mut phones = ledger.phones.lock().unwrap();
            phones.insert("buyer".into(), "081111111111".into());
            phones.insert("farmer".into(), "082222222222".into());
            drop(phones);
            ledger
        }

        pub fn status(&self, id: i64) -> OrderStatus {
            self.orders.lock().unwrap()[&id].status
        }

        pub fn fail_transitions(&self, fail: bool) {
            self.fail_transition.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl OrderLedger for MemoryLedger {
        async fn record_event(&self, event_key: &str, _source: &str) -> Result<bool, BoxError> {
            Ok(self.events.lock().unwrap().insert(event_key.to_string()))
        }

        async fn forget_event(&self, event_key: &str) -> Result<(), BoxError> {
            self.events.lock().unwrap().remove(event_key);
            Ok(())
        }

        async fn find_by_number(&self, order_number: &str) -> Result<Option<OrderSnapshot>, BoxError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .values()
                .find(|o| o.order_number == order_number)
                .cloned())
        }

        async fn find_by_courier_order(
            &self,
            courier_order_id: &str,
            waybill_id: Option<&str>,
        ) -> Result<Option<OrderSnapshot>, BoxError> {
            let orders = self.orders.lock().unwrap();
            if let Some(id) = self.courier_ids.lock().unwrap().get(courier_order_id) {
                return Ok(orders.get(id).cloned());
            }
            Ok(waybill_id.and_then(|w| {
                orders
                    .values()
                    .find(|o| o.waybill_id.as_deref() == Some(w))
                    .cloned()
            }))
        }

        async fn transition(
            &self,
            order_id: i64,
            from: OrderStatus,
            to: OrderStatus,
            effect: &TransitionEffect,
        ) -> Result<bool, BoxError> {
            if self.fail_transition.load(Ordering::SeqCst) {
                return Err("connection reset".into());
            }
            let mut orders = self.orders.lock().unwrap();
            let Some(order) = orders.get_mut(&order_id) else {
                return Ok(false);
            };
            if order.status != from {
                return Ok(false);
            }
            order.status = to;
            self.effects.lock().unwrap().push((order_id, effect.clone()));
            Ok(true)
        }

        async fn update_tracking(&self, order_id: i64, update: &TrackingUpdate) -> Result<(), BoxError> {
            self.tracking.lock().unwrap().push((order_id, update.clone()));
            Ok(())
        }

        async fn phone_of(&self, user_id: &str) -> Result<Option<String>, BoxError> {
            Ok(self.phones.lock().unwrap().get(user_id).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryLedger;
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::payment::testing::signed_notification;
    use OrderStatus::*;

    const BUYER: &str = "6281111111111";
    const FARMER: &str = "6282222222222";

    fn settlement() -> PaymentNotification {
        signed_notification("ECO-20261018-1", "settlement", "82500.00", "key")
    }

    fn courier(event: &str, status: Option<&str>, waybill: Option<&str>) -> CourierEvent {
        CourierEvent {
            event: event.into(),
            order_id: "bs-1".into(),
            courier_waybill_id: waybill.map(Into::into),
            courier_company: Some("jne".into()),
            status: status.map(Into::into),
            price: None,
        }
    }

    #[tokio::test]
    async fn test_payment_after_cancel_is_flagged_once() {
        let ledger = MemoryLedger::with_order(Cancelled);
        let notifier = RecordingNotifier::default();

        let outcome = reconcile_payment(&ledger, &notifier, &settlement()).await.unwrap();
        assert_eq!(outcome, Outcome::PaidAfterCancel);
        assert_eq!(ledger.status(1), Cancelled);
        assert!(ledger.effects.lock().unwrap().is_empty());
        let msgs = notifier.messages_to(BUYER);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("pengembalian dana"));

        assert_eq!(
            reconcile_payment(&ledger, &notifier, &settlement()).await.unwrap(),
            Outcome::Duplicate
        );
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_expiry_after_cancel_is_no_change() {
        let ledger = MemoryLedger::with_order(Cancelled);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-1", "expire", "82500.00", "key");

        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::NoChange
        );
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_courier_price_revisions_are_all_stored() {
        let ledger = MemoryLedger::with_order(Shipped);
        let notifier = RecordingNotifier::default();

        for price in [18_000, 25_000] {
            let mut ev = courier("order.price", None, Some("WB1"));
            ev.price = Some(price);
            assert_eq!(
                reconcile_courier(&ledger, &notifier, &ev).await.unwrap(),
                Outcome::TrackingUpdated
            );
        }
        let prices: Vec<_> = ledger.tracking.lock().unwrap().iter().map(|(_, u)| u.price).collect();
        assert_eq!(prices, vec![Some(18_000), Some(25_000)]);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_settlement_marks_packed_and_notifies_both_parties() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();

        let outcome = reconcile_payment(&ledger, &notifier, &settlement()).await.unwrap();
        assert_eq!(outcome, Outcome::StatusChanged(Packed));
        assert_eq!(ledger.status(1), Packed);
        assert_eq!(notifier.messages_to(BUYER).len(), 1);
        assert_eq!(notifier.messages_to(FARMER).len(), 1);
        assert_eq!(
            ledger.effects.lock().unwrap()[0].1,
            TransitionEffect::Paid {
                payment_method: Some("bank_transfer".into())
            }
        );
    }

    #[tokio::test]
    async fn test_repeated_delivery_sends_notifications_once() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = settlement();

        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::StatusChanged(Packed)
        );
        for _ in 0..3 {
            assert_eq!(
                reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
                Outcome::Duplicate
            );
        }
        assert_eq!(notifier.count(), 2);
        assert_eq!(ledger.effects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settlement_after_capture_does_not_renotify() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();

        let capture = signed_notification("ECO-20261018-1", "capture", "82500.00", "key");
        reconcile_payment(&ledger, &notifier, &capture).await.unwrap();
        let outcome = reconcile_payment(&ledger, &notifier, &settlement()).await.unwrap();

        assert_eq!(outcome, Outcome::NoChange);
        assert_eq!(notifier.count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_status_is_ignored() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-1", "authorize", "82500.00", "key");

        let outcome = reconcile_payment(&ledger, &notifier, &n).await.unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(ledger.status(1), Unpaid);
        assert!(ledger.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_order_is_error() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-404", "settlement", "82500.00", "key");

        let err = reconcile_payment(&ledger, &notifier, &n).await.unwrap_err();
        assert!(matches!(err, ReconcileError::OrderNotFound(id) if id == "ECO-20261018-404"));
    }

    #[tokio::test]
    async fn test_amount_mismatch_is_ignored() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-1", "settlement", "1000.00", "key");

        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::Ignored
        );
        assert_eq!(ledger.status(1), Unpaid);
    }

    #[tokio::test]
    async fn test_expire_cancels_and_notifies_buyer() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-1", "expire", "82500.00", "key");

        let outcome = reconcile_payment(&ledger, &notifier, &n).await.unwrap();
        assert_eq!(outcome, Outcome::StatusChanged(Cancelled));
        let msgs = notifier.messages_to(BUYER);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("batas waktu pembayaran habis"));
        assert!(notifier.messages_to(FARMER).is_empty());
    }

    #[tokio::test]
    async fn test_refund_cancels_packed_but_not_shipped() {
        let ledger = MemoryLedger::with_order(Packed);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-1", "refund", "82500.00", "key");
        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::StatusChanged(Cancelled)
        );

        let ledger = MemoryLedger::with_order(Shipped);
        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::NoChange
        );
        assert_eq!(ledger.status(1), Shipped);
    }

    #[tokio::test]
    async fn test_pending_on_unpaid_is_no_change() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = signed_notification("ECO-20261018-1", "pending", "82500.00", "key");
        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::NoChange
        );
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_releases_event_for_retry() {
        let ledger = MemoryLedger::with_order(Unpaid);
        let notifier = RecordingNotifier::default();
        let n = settlement();

        ledger.fail_transitions(true);
        let err = reconcile_payment(&ledger, &notifier, &n).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Store(_)));
        assert!(ledger.events.lock().unwrap().is_empty());
        assert_eq!(notifier.count(), 0);

        ledger.fail_transitions(false);
        assert_eq!(
            reconcile_payment(&ledger, &notifier, &n).await.unwrap(),
            Outcome::StatusChanged(Packed)
        );
        assert_eq!(notifier.count(), 2);
    }

    #[tokio::test]
    async fn test_courier_picked_ships_order() {
        let ledger = MemoryLedger::with_order(Packed);
        let notifier = RecordingNotifier::default();
        let ev = courier("order.status", Some("picked"), Some("JX123"));

        let outcome = reconcile_courier(&ledger, &notifier, &ev).await.unwrap();
        assert_eq!(outcome, Outcome::StatusChanged(Shipped));
        let msgs = notifier.messages_to(BUYER);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("JX123"));
        assert_eq!(ledger.tracking.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_courier_duplicate_and_backward_moves() {
        let ledger = MemoryLedger::with_order(Packed);
        let notifier = RecordingNotifier::default();

        let delivered = courier("order.status", Some("delivered"), None);
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &delivered).await.unwrap(),
            Outcome::StatusChanged(Completed)
        );
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &delivered).await.unwrap(),
            Outcome::Duplicate
        );

        // late "picked" after delivery only updates tracking
        let picked = courier("order.status", Some("picked"), None);
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &picked).await.unwrap(),
            Outcome::TrackingUpdated
        );
        assert_eq!(ledger.status(1), Completed);
        assert_eq!(notifier.messages_to(FARMER).len(), 1);
    }

    #[tokio::test]
    async fn test_courier_tracking_only_and_unknown() {
        let ledger = MemoryLedger::with_order(Packed);
        let notifier = RecordingNotifier::default();

        let allocated = courier("order.status", Some("allocated"), None);
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &allocated).await.unwrap(),
            Outcome::TrackingUpdated
        );
        let waybill = courier("order.waybill_id", None, Some("JX9"));
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &waybill).await.unwrap(),
            Outcome::TrackingUpdated
        );
        let unknown = courier("order.status", Some("lost_in_space"), None);
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &unknown).await.unwrap(),
            Outcome::Ignored
        );
        let odd = courier("order.created", None, None);
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &odd).await.unwrap(),
            Outcome::Ignored
        );

        assert_eq!(ledger.status(1), Packed);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_courier_lookup_falls_back_to_waybill() {
        let ledger = MemoryLedger::with_order(Shipped);
        ledger.courier_ids.lock().unwrap().clear();
        ledger.orders.lock().unwrap().get_mut(&1).unwrap().waybill_id = Some("JX123".into());
        let notifier = RecordingNotifier::default();

        let mut ev = courier("order.status", Some("returned"), Some("JX123"));
        ev.order_id = "bs-unknown".into();
        assert_eq!(
            reconcile_courier(&ledger, &notifier, &ev).await.unwrap(),
            Outcome::StatusChanged(Cancelled)
        );

        let mut ev = courier("order.status", Some("returned"), Some("NOPE"));
        ev.order_id = "bs-unknown".into();
        assert!(matches!(
            reconcile_courier(&ledger, &notifier, &ev).await,
            Err(ReconcileError::OrderNotFound(_))
        ));
    }
}
