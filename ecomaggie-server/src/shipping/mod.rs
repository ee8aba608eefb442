//! Courier webhook payloads (Biteship-compatible) and status mapping

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shared::models::OrderStatus;

/// Header carrying `hex(HMAC-SHA256(secret, body))`
pub const SIGNATURE_HEADER: &str = "x-ecomaggie-signature";

/// Verify the courier webhook signature over the raw request body
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), &'static str> {
    if signature.is_empty() {
        return Err("Missing webhook signature");
    }
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(payload);

    let sig_bytes = hex::decode(signature.trim()).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;
    Ok(())
}

/// Courier callback body
#[derive(Debug, Clone, Deserialize)]
pub struct CourierEvent {
    pub event: String,
    /// Courier-side order id
    pub order_id: String,
    pub courier_waybill_id: Option<String>,
    pub courier_company: Option<String>,
    pub status: Option<String>,
    /// Only on `order.price`
    pub price: Option<i64>,
}

impl CourierEvent {
    pub fn kind(&self) -> CourierEventKind {
        match self.event.as_str() {
            "order.status" => CourierEventKind::Status,
            "order.waybill_id" => CourierEventKind::Waybill,
            "order.price" => CourierEventKind::Price,
            _ => CourierEventKind::Unknown,
        }
    }

    /// Deduplication key; price revisions are keyed by the quoted price
    pub fn event_key(&self) -> String {
        let discriminator = match (self.kind(), self.price) {
            (CourierEventKind::Price, Some(price)) => price.to_string(),
            _ => self
                .status
                .as_deref()
                .or(self.courier_waybill_id.as_deref())
                .unwrap_or("-")
                .to_string(),
        };
        format!("shipping:{}:{}:{discriminator}", self.order_id, self.event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierEventKind {
    Status,
    Waybill,
    Price,
    Unknown,
}

/// What a courier status means for the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierEffect {
    /// Move the order to this status (forward only, or cancel)
    Order(OrderStatus),
    /// Store the tracking status, order unchanged
    TrackingOnly,
}

pub fn map_courier_status(status: &str) -> Option<CourierEffect> {
    match status {
        "picked" | "dropping_off" | "on_hold" => Some(CourierEffect::Order(OrderStatus::Shipped)),
        "delivered" => Some(CourierEffect::Order(OrderStatus::Completed)),
        "cancelled" | "rejected" | "courier_not_found" | "returned" | "disposed" => {
            Some(CourierEffect::Order(OrderStatus::Cancelled))
        }
        "confirmed" | "scheduled" | "allocated" | "picking_up" => Some(CourierEffect::TrackingOnly),
        _ => None,
    }
}

/// Whether a courier update may move an order from `current` to `target`.
///
/// Forward moves only; cancellation from any non-terminal state.
pub fn courier_applies(current: OrderStatus, target: OrderStatus) -> bool {
    if current.is_terminal() || current == target {
        return false;
    }
    match (current.rank(), target.rank()) {
        (_, None) => true,
        (Some(from), Some(to)) => to > from,
        (None, Some(_)) => false,
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    pub fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}
