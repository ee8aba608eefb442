//! WhatsApp notification dispatch
//!
//! Messages are a side effect of status transitions. Send failures are logged
//! and never fail the request that triggered them.

pub mod templates;

use async_trait::async_trait;
use shared::util::normalize_phone;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("WhatsApp request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WhatsApp gateway rejected message: {0}")]
    Rejected(String),
}

/// Outbound message channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `message` to an already-normalized `62…` number
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError>;
}

/// Fonnte-compatible WhatsApp gateway client
pub struct WhatsAppNotifier {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl WhatsAppNotifier {
    pub fn new(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url,
            token,
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        if self.token.is_empty() {
            tracing::debug!(phone = phone, "WhatsApp token not configured, message dropped");
            return Ok(());
        }

        let resp: serde_json::Value = self
            .client
            .post(&self.api_url)
            .header("Authorization", &self.token)
            .form(&[
                ("target", phone),
                ("message", message),
                ("countryCode", "62"),
            ])
            .send()
            .await?
            .json()
            .await?;

        // Gateway answers 200 with {"status": false, "reason": "..."} on failure
        if resp["status"].as_bool() == Some(false) {
            let reason = resp["reason"].as_str().unwrap_or("unknown").to_string();
            return Err(NotifyError::Rejected(reason));
        }

        tracing::info!(phone = phone, "WhatsApp message sent");
        Ok(())
    }
}

/// Normalize `raw_phone` and send; errors are logged, not returned.
pub async fn dispatch(notifier: &dyn Notifier, raw_phone: Option<&str>, message: &str) {
    let Some(raw) = raw_phone.filter(|p| !p.trim().is_empty()) else {
        tracing::debug!("Recipient has no phone number, notification skipped");
        return;
    };
    let Some(phone) = normalize_phone(raw) else {
        tracing::warn!(error = %NotifyError::InvalidPhone(raw.to_string()), "Notification skipped");
        return;
    };
    if let Err(e) = notifier.send(&phone, message).await {
        tracing::warn!(error = %e, phone = %phone, "Failed to send WhatsApp notification");
    }
}
