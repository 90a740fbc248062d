use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;

use crate::bot::dto::{ApiEnvelope, SendMessagePayload, Update};

/// Thin Telegram Bot API client over long polling.
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("https://api.telegram.org/bot{}", token),
        }
    }

    /// Long-polls for the next batch of updates at or after `offset`.
    pub async fn get_updates(&self, offset: i64, poll_timeout_secs: u64) -> Result<Vec<Update>> {
        let resp = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", poll_timeout_secs.to_string()),
            ])
            // The request itself must outlive the server-side poll window.
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("getUpdates returned {}: {}", status, text));
        }

        let envelope: ApiEnvelope<Vec<Update>> = resp.json().await?;
        if !envelope.ok {
            return Err(anyhow!(
                "getUpdates rejected: {}",
                envelope.description.unwrap_or_default()
            ));
        }
        Ok(envelope.result.unwrap_or_default())
    }

    /// Sends one HTML-formatted text reply to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let payload = SendMessagePayload {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        let resp = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("sendMessage returned {}: {}", status, text));
        }

        let envelope: ApiEnvelope<serde_json::Value> = resp.json().await?;
        if !envelope.ok {
            return Err(anyhow!(
                "sendMessage rejected: {}",
                envelope.description.unwrap_or_default()
            ));
        }
        Ok(())
    }
}
