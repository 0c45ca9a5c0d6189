// vendbot/bot/src/storefront/update.rs

//! The subset of the Bot API `Update` object the storefront reads.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id: i64,
  #[serde(default)]
  pub message: Option<Message>,
  #[serde(default)]
  pub callback_query: Option<CallbackQuery>,
}

impl Update {
  /// The chat this update came from, if any.
  pub fn chat_id(&self) -> Option<i64> {
    match (&self.message, &self.callback_query) {
      (Some(message), _) => Some(message.chat.id),
      (None, Some(query)) => Some(query.message.as_ref().map_or(query.from.id, |m| m.chat.id)),
      (None, None) => None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
  pub message_id: i64,
  #[serde(default)]
  pub from: Option<User>,
  pub chat: Chat,
  #[serde(default)]
  pub text: Option<String>,
}

impl Message {
  /// Sender id, falling back to the chat id for anonymous channel posts.
  pub fn sender_id(&self) -> i64 {
    self.from.as_ref().map_or(self.chat.id, |u| u.id)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
  pub id: i64,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name: Option<String>,
}

impl User {
  pub fn full_name(&self) -> String {
    match &self.last_name {
      Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
      _ => self.first_name.clone(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
  pub id: String,
  pub from: User,
  #[serde(default)]
  pub message: Option<Message>,
  #[serde(default)]
  pub data: Option<String>,
}
