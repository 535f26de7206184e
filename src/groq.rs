use serde_json::{json, Value};
use tracing::warn;

use plantita_monitor::advice::{
    alert_prompt, status_prompt, AdviceGenerator, FALLBACK_ALERT_TEXT, FALLBACK_STATUS_TEXT,
};
use plantita_monitor::domain::{Alert, PlantRecord};

pub const GROQ_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Chat-completion client backed by Groq
///
/// Advice rendering never fails outward. Any API problem falls back to the
/// canned texts so an alert still reaches the subject.
#[derive(Debug, Clone)]
pub struct GroqAdviceClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
enum CompletionError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion rejected with status {status}")]
    Status { status: u16 },

    #[error("Completion response carried no content")]
    MissingContent,
}

impl GroqAdviceClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http
            .post(GROQ_CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
            });
        }

        let payload: Value = response.json().await?;
        extract_content(&payload).ok_or(CompletionError::MissingContent)
    }
}

/// Pull the first choice's message content out of a chat-completion response
fn extract_content(payload: &Value) -> Option<String> {
    let content = payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl AdviceGenerator for GroqAdviceClient {
    async fn render_alert(&self, record: &PlantRecord, alert: &Alert) -> String {
        let prompt = alert_prompt(record, alert);

        match self.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Falling back to canned alert text: {}", e);
                FALLBACK_ALERT_TEXT.to_string()
            }
        }
    }

    async fn render_status(&self, record: &PlantRecord) -> String {
        let prompt = status_prompt(record);

        match self.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Falling back to canned status text: {}", e);
                FALLBACK_STATUS_TEXT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content_trims_text() {
        let payload = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  Water your plant soon.  " } }
            ]
        });

        assert_eq!(
            extract_content(&payload).as_deref(),
            Some("Water your plant soon.")
        );
    }

    #[test]
    fn test_extract_content_missing_choices() {
        assert_eq!(extract_content(&json!({})), None);
        assert_eq!(extract_content(&json!({ "choices": [] })), None);
    }

    #[test]
    fn test_extract_content_rejects_blank_text() {
        let payload = json!({
            "choices": [{ "message": { "content": "   " } }]
        });

        assert_eq!(extract_content(&payload), None);
    }

    #[test]
    fn test_extract_content_rejects_non_string() {
        let payload = json!({
            "choices": [{ "message": { "content": 42 } }]
        });

        assert_eq!(extract_content(&payload), None);
    }
}
