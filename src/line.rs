use serde_json::{json, Value};
use tracing::debug;

use plantita_monitor::error::DeliveryError;
use plantita_monitor::notify::NotificationSink;

pub const LINE_PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

/// LINE Messaging API push client
#[derive(Debug, Clone)]
pub struct LineNotifier {
    http: reqwest::Client,
    channel_access_token: String,
}

impl LineNotifier {
    pub fn new(http: reqwest::Client, channel_access_token: impl Into<String>) -> Self {
        Self {
            http,
            channel_access_token: channel_access_token.into(),
        }
    }
}

/// Build the push request body for a single text message
fn push_payload(subject_id: &str, text: &str) -> Value {
    json!({
        "to": subject_id,
        "messages": [{ "type": "text", "text": text }],
    })
}

impl NotificationSink for LineNotifier {
    async fn push(&self, subject_id: &str, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(LINE_PUSH_URL)
            .bearer_auth(&self.channel_access_token)
            .json(&push_payload(subject_id, text))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(subject_id = %subject_id, "Push message accepted");
        Ok(())
    }
}
