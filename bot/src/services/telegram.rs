// vendbot/bot/src/services/telegram.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, instrument, warn};

use super::chat::{ChatTransport, Keyboard};
use crate::errors::{AppError, Result as AppResult};

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiReply {
  ok: bool,
  #[serde(default)]
  description: Option<String>,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bot API client. Requests go to `{api_base}/bot{token}/{method}`.
#[derive(Clone)]
pub struct TelegramClient {
  client: reqwest::Client,
  endpoint: String,
}

impl TelegramClient {
  pub fn new(api_base: &str, token: &str) -> AppResult<Self> {
    Ok(Self {
      client: super::http_client(REQUEST_TIMEOUT)?,
      endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
    })
  }

  async fn call(&self, method: &str, mut body: JsonValue, keyboard: Option<Keyboard>) -> AppResult<()> {
    if let Some(keyboard) = keyboard {
      body["reply_markup"] = serde_json::to_value(keyboard)
        .map_err(|e| AppError::Internal(format!("Failed to encode keyboard: {}", e)))?;
    }

    // The endpoint embeds the bot token; reqwest errors are stripped of it before they are logged.
    let response = self
      .client
      .post(format!("{}/{}", self.endpoint, method))
      .json(&body)
      .send()
      .await
      .map_err(|e| AppError::Chat(format!("{} request failed: {}", method, e.without_url())))?;

    let status = response.status();
    let reply: ApiReply = response
      .json()
      .await
      .map_err(|e| AppError::Chat(format!("{} returned an unreadable body ({}): {}", method, status, e.without_url())))?;

    if !status.is_success() || !reply.ok {
      let description = reply.description.unwrap_or_default();
      warn!(method, %status, %description, "Bot API call rejected.");
      return Err(AppError::Chat(format!("{} rejected: {}", method, description)));
    }
    debug!(method, "Bot API call succeeded.");
    Ok(())
  }
}

#[async_trait]
impl ChatTransport for TelegramClient {
  #[instrument(skip(self, text, keyboard))]
  async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> AppResult<()> {
    self
      .call("sendMessage", json!({ "chat_id": chat_id, "text": text }), keyboard)
      .await
  }

  #[instrument(skip(self, caption, keyboard))]
  async fn send_photo(
    &self,
    chat_id: i64,
    photo_url: &str,
    caption: &str,
    keyboard: Option<Keyboard>,
  ) -> AppResult<()> {
    self
      .call(
        "sendPhoto",
        json!({ "chat_id": chat_id, "photo": photo_url, "caption": caption }),
        keyboard,
      )
      .await
  }

  #[instrument(skip(self, text, keyboard))]
  async fn edit_message(
    &self,
    chat_id: i64,
    message_id: i64,
    text: &str,
    keyboard: Option<Keyboard>,
  ) -> AppResult<()> {
    self
      .call(
        "editMessageText",
        json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
        keyboard,
      )
      .await
  }

  #[instrument(skip(self))]
  async fn answer_callback(&self, callback_id: &str) -> AppResult<()> {
    self
      .call("answerCallbackQuery", json!({ "callback_query_id": callback_id }), None)
      .await
  }

  #[instrument(skip(self, secret_token))]
  async fn set_webhook(&self, url: &str, secret_token: &str) -> AppResult<()> {
    self
      .call("setWebhook", json!({ "url": url, "secret_token": secret_token }), None)
      .await?;
    info!("Telegram webhook registered.");
    Ok(())
  }
}
