//! Payment gateway integration via REST API (Midtrans Snap, no SDK dependency)

pub mod status;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

pub use status::{StatusMapError, map_transaction_status, payment_applies};

/// Transaction status notification posted by the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    /// Our `order_number`
    pub order_id: String,
    pub status_code: String,
    /// Decimal string, e.g. "150000.00"
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    pub transaction_id: String,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
}

impl PaymentNotification {
    /// Deduplication key: one delivery per transaction per status.
    /// A fraud verdict is appended so a challenged capture can later be accepted.
    pub fn event_key(&self) -> String {
        match self.fraud_status.as_deref() {
            Some(fraud) => format!("payment:{}:{}:{fraud}", self.transaction_id, self.transaction_status),
            None => format!("payment:{}:{}", self.transaction_id, self.transaction_status),
        }
    }

    /// Whole Rupiah from `gross_amount` (IDR has no minor unit in practice)
    pub fn gross_amount_rupiah(&self) -> Option<i64> {
        let whole = match self.gross_amount.split_once('.') {
            Some((whole, frac)) if frac.bytes().all(|b| b == b'0') => whole,
            Some(_) => return None,
            None => self.gross_amount.as_str(),
        };
        whole.parse().ok()
    }
}

/// Verify the notification's `signature_key`:
/// `hex(SHA-512(order_id + status_code + gross_amount + server_key))`
pub fn verify_signature(notification: &PaymentNotification, server_key: &str) -> Result<(), &'static str> {
    if notification.signature_key.is_empty() {
        return Err("Missing signature_key");
    }

    let mut hasher = Sha512::new();
    hasher.update(notification.order_id.as_bytes());
    hasher.update(notification.status_code.as_bytes());
    hasher.update(notification.gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    let expected = hasher.finalize();

    let provided = hex::decode(&notification.signature_key).map_err(|_| "Invalid signature hex")?;
    if !constant_time_eq(expected.as_slice(), &provided) {
        return Err("Payment signature mismatch");
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment gateway rejected transaction: {0}")]
    Rejected(String),
}

/// Line shown on the hosted payment page
#[derive(Debug, Clone, Serialize)]
pub struct SnapItem {
    pub id: String,
    pub price: i64,
    pub quantity: i32,
    pub name: String,
}

impl SnapItem {
    pub fn new(id: impl Into<String>, price: i64, quantity: i32, name: &str) -> Self {
        // gateway limit
        let name: String = name.chars().take(50).collect();
        Self {
            id: id.into(),
            price,
            quantity,
            name,
        }
    }
}

/// Snap transaction request
#[derive(Debug, Clone)]
pub struct SnapRequest<'a> {
    pub order_number: &'a str,
    pub gross_amount: i64,
    pub items: Vec<SnapItem>,
    pub customer_name: &'a str,
    pub customer_phone: Option<&'a str>,
    pub finish_url: String,
}

/// Snap transaction handle returned to the browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapTransaction {
    pub token: String,
    pub redirect_url: String,
}

/// Payment gateway client
#[derive(Clone)]
pub struct MidtransClient {
    client: reqwest::Client,
    server_key: String,
    /// Snap (hosted payment page) API
    base_url: &'static str,
    /// Core API (transaction management)
    api_base_url: &'static str,
}

impl MidtransClient {
    pub fn new(client: reqwest::Client, server_key: String, is_production: bool) -> Self {
        let (base_url, api_base_url) = if is_production {
            ("https://app.midtrans.com", "https://api.midtrans.com")
        } else {
            ("https://app.sandbox.midtrans.com", "https://api.sandbox.midtrans.com")
        };
        Self {
            client,
            server_key,
            base_url,
            api_base_url,
        }
    }

    pub fn server_key(&self) -> &str {
        &self.server_key
    }

    /// Create a Snap transaction for an unpaid order
    pub async fn create_transaction(&self, req: &SnapRequest<'_>) -> Result<SnapTransaction, GatewayError> {
        let body = serde_json::json!({
            "transaction_details": {
                "order_id": req.order_number,
                "gross_amount": req.gross_amount,
            },
            "item_details": req.items,
            "customer_details": {
                "first_name": req.customer_name,
                "phone": req.customer_phone,
            },
            "callbacks": { "finish": req.finish_url },
        });

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/snap/v1/transactions", self.base_url))
            .basic_auth(&self.server_key, None::<&str>)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        match (resp["token"].as_str(), resp["redirect_url"].as_str()) {
            (Some(token), Some(url)) => Ok(SnapTransaction {
                token: token.to_string(),
                redirect_url: url.to_string(),
            }),
            _ => Err(GatewayError::Rejected(resp["error_messages"].to_string())),
        }
    }

    /// Cancel a transaction that has not been paid yet
    pub async fn cancel_transaction(&self, order_number: &str) -> Result<(), GatewayError> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/v2/{order_number}/cancel", self.api_base_url))
            .basic_auth(&self.server_key, None::<&str>)
            .send()
            .await?
            .json()
            .await?;

        if cancel_accepted(resp["status_code"].as_str()) {
            Ok(())
        } else {
            Err(GatewayError::Rejected(resp["status_message"].to_string()))
        }
    }
}

/// 404: the buyer never chose a payment method, so nothing is payable
fn cancel_accepted(status_code: Option<&str>) -> bool {
    matches!(status_code, Some("200" | "404"))
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Build a notification signed with `server_key`
    pub fn signed_notification(
        order_id: &str,
        transaction_status: &str,
        gross_amount: &str,
        server_key: &str,
    ) -> PaymentNotification {
        let status_code = if transaction_status == "pending" { "201" } else { "200" };
        let mut hasher = Sha512::new();
        hasher.update(format!("{order_id}{status_code}{gross_amount}{server_key}"));
        PaymentNotification {
            order_id: order_id.to_string(),
            status_code: status_code.to_string(),
            gross_amount: gross_amount.to_string(),
            signature_key: hex::encode(hasher.finalize()),
            transaction_status: transaction_status.to_string(),
            transaction_id: format!("trx-{order_id}"),
            fraud_status: None,
            payment_type: Some("bank_transfer".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::signed_notification;
    use super::*;

    const KEY: &str = "SB-Mid-server-test";

    #[test]
    fn test_valid_signature() {
        let n = signed_notification("ECO-20261018-1", "settlement", "82500.00", KEY);
        assert!(verify_signature(&n, KEY).is_ok());
    }

    #[test]
    fn test_uppercase_hex_signature_accepted() {
        let mut n = signed_notification("ECO-20261018-1", "settlement", "82500.00", KEY);
        n.signature_key = n.signature_key.to_uppercase();
        assert!(verify_signature(&n, KEY).is_ok());
    }

    #[test]
    fn test_tampered_amount_rejected() {
        let mut n = signed_notification("ECO-20261018-1", "settlement", "82500.00", KEY);
        n.gross_amount = "1.00".into();
        assert_eq!(verify_signature(&n, KEY), Err("Payment signature mismatch"));
    }

    #[test]
    fn test_tampered_order_and_status_code_rejected() {
        let mut n = signed_notification("ECO-20261018-1", "settlement", "82500.00", KEY);
        n.order_id = "ECO-20261018-2".into();
        assert!(verify_signature(&n, KEY).is_err());

        let mut n = signed_notification("ECO-20261018-1", "pending", "82500.00", KEY);
        n.status_code = "200".into();
        assert!(verify_signature(&n, KEY).is_err());
    }

    #[test]
    fn test_wrong_key_and_garbage_rejected() {
        let n = signed_notification("ECO-20261018-1", "settlement", "82500.00", KEY);
        assert!(verify_signature(&n, "another-key").is_err());

        let mut n = n;
        n.signature_key = "not-hex".into();
        assert_eq!(verify_signature(&n, KEY), Err("Invalid signature hex"));
        n.signature_key = String::new();
        assert_eq!(verify_signature(&n, KEY), Err("Missing signature_key"));
    }

    #[test]
    fn test_gross_amount_parse() {
        let mut n = signed_notification("o", "settlement", "82500.00", KEY);
        assert_eq!(n.gross_amount_rupiah(), Some(82_500));
        n.gross_amount = "82500".into();
        assert_eq!(n.gross_amount_rupiah(), Some(82_500));
        n.gross_amount = "82500.50".into();
        assert_eq!(n.gross_amount_rupiah(), None);
    }

    #[test]
    fn test_event_key_distinguishes_status() {
        let a = signed_notification("o", "pending", "1000.00", KEY);
        let b = signed_notification("o", "settlement", "1000.00", KEY);
        assert_ne!(a.event_key(), b.event_key());
        assert_eq!(a.event_key(), "payment:trx-o:pending");

        let mut challenged = signed_notification("o", "capture", "1000.00", KEY);
        challenged.fraud_status = Some("challenge".into());
        let mut accepted = challenged.clone();
        accepted.fraud_status = Some("accept".into());
        assert_ne!(challenged.event_key(), accepted.event_key());
    }

    #[test]
    fn test_cancel_status_codes() {
        assert!(cancel_accepted(Some("200")));
        assert!(cancel_accepted(Some("404")));
        // already settled or expired
        assert!(!cancel_accepted(Some("412")));
        assert!(!cancel_accepted(None));
    }

    #[test]
    fn test_snap_item_name_truncated() {
        let long = "Maggot BSF segar kualitas premium langsung dari peternakan Lembang";
        let item = SnapItem::new("1", 8_000, 2, long);
        assert_eq!(item.name.chars().count(), 50);
    }
}
