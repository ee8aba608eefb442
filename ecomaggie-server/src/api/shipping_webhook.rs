//! Courier callback handler
//!
//! GET/POST /webhooks/shipping: the courier probes the URL with GET or an
//! empty POST when the webhook is installed

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::services::ledger::PgLedger;
use crate::services::reconcile::{self, ReconcileError};
use crate::shipping::{self, CourierEvent};
use crate::state::AppState;

/// Installation probe
pub async fn probe() -> StatusCode {
    StatusCode::OK
}

/// Handle a courier status / waybill / price callback
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if body.iter().all(u8::is_ascii_whitespace) {
        return StatusCode::OK;
    }

    // 1. Verify HMAC over the raw body
    let signature = headers
        .get(shipping::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if let Err(e) = shipping::verify_signature(&body, signature, &state.shipping_webhook_secret) {
        tracing::warn!(error = e, "Courier webhook signature verification failed");
        return StatusCode::UNAUTHORIZED;
    }

    // 2. Parse
    let event: CourierEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse courier webhook");
            return StatusCode::BAD_REQUEST;
        }
    };
    tracing::info!(
        event = %event.event,
        courier_order_id = %event.order_id,
        status = ?event.status,
        "Received courier webhook"
    );

    // 3. Reconcile
    let ledger = PgLedger::new(state.pool.clone());
    match reconcile::reconcile_courier(&ledger, state.notifier.as_ref(), &event).await {
        Ok(outcome) => {
            tracing::info!(courier_order_id = %event.order_id, ?outcome, "Courier webhook processed");
            StatusCode::OK
        }
        Err(ReconcileError::OrderNotFound(id)) => {
            tracing::warn!(courier_order_id = %id, "Courier webhook for unknown order");
            StatusCode::NOT_FOUND
        }
        Err(ReconcileError::Store(e)) => {
            tracing::error!(%e, courier_order_id = %event.order_id, "Failed to apply courier webhook");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::create_router;
    use crate::shipping::{SIGNATURE_HEADER, testing::sign};
    use crate::state::testing::{SHIPPING_SECRET, lazy_state};

    const BODY: &str = r#"{"event":"order.status","order_id":"bs-1","status":"delivered"}"#;

    async fn send(req: Request<Body>) -> StatusCode {
        create_router(lazy_state()).oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_probe_and_empty_post_acknowledged() {
        let get = Request::get("/webhooks/shipping").body(Body::empty()).unwrap();
        assert_eq!(send(get).await, StatusCode::OK);

        let empty = Request::post("/webhooks/shipping").body(Body::empty()).unwrap();
        assert_eq!(send(empty).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_signature_rejected() {
        let req = Request::post("/webhooks/shipping")
            .header("content-type", "application/json")
            .body(Body::from(BODY))
            .unwrap();
        assert_eq!(send(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signature_for_other_body_rejected() {
        let sig = sign(br#"{"event":"order.status","order_id":"bs-1","status":"picked"}"#, SHIPPING_SECRET);
        let req = Request::post("/webhooks/shipping")
            .header(SIGNATURE_HEADER, sig)
            .body(Body::from(BODY))
            .unwrap();
        assert_eq!(send(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signed_garbage_is_bad_request() {
        let body = "{not json";
        let req = Request::post("/webhooks/shipping")
            .header(SIGNATURE_HEADER, sign(body.as_bytes(), SHIPPING_SECRET))
            .body(Body::from(body))
            .unwrap();
        assert_eq!(send(req).await, StatusCode::BAD_REQUEST);
    }
}
