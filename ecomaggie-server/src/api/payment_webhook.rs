//! Payment gateway notification handler
//!
//! POST /webhooks/payment: raw body, signature checked before any DB access

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use crate::payment::{self, PaymentNotification};
use crate::services::ledger::PgLedger;
use crate::services::reconcile::{self, ReconcileError};
use crate::state::AppState;

/// Handle a transaction status notification
pub async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    // 1. Parse
    let notification: PaymentNotification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse payment notification");
            return StatusCode::BAD_REQUEST;
        }
    };

    // 2. Verify signature
    if let Err(e) = payment::verify_signature(&notification, state.midtrans.server_key()) {
        tracing::warn!(
            error = e,
            order_number = %notification.order_id,
            "Payment notification signature verification failed"
        );
        return StatusCode::UNAUTHORIZED;
    }

    tracing::info!(
        order_number = %notification.order_id,
        transaction_status = %notification.transaction_status,
        fraud_status = ?notification.fraud_status,
        "Received payment notification"
    );

    // 3. Reconcile
    let ledger = PgLedger::new(state.pool.clone());
    match reconcile::reconcile_payment(&ledger, state.notifier.as_ref(), &notification).await {
        Ok(outcome) => {
            tracing::info!(order_number = %notification.order_id, ?outcome, "Payment notification processed");
            StatusCode::OK
        }
        Err(ReconcileError::OrderNotFound(number)) => {
            tracing::warn!(order_number = %number, "Payment notification for unknown order");
            StatusCode::NOT_FOUND
        }
        Err(ReconcileError::Store(e)) => {
            tracing::error!(%e, order_number = %notification.order_id, "Failed to apply payment notification");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
