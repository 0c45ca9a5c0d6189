// vendbot/bot/src/services/chat.rs
use async_trait::async_trait;
use serde::Serialize;

use crate::errors::Result as AppResult;

/// One tappable button under a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
  pub text: String,
  pub callback_data: String,
}

impl InlineButton {
  pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      callback_data: callback_data.into(),
    }
  }
}

/// Inline keyboard; serialises as a Bot API `reply_markup`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
  pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl Keyboard {
  pub fn single(button: InlineButton) -> Self {
    Self {
      inline_keyboard: vec![vec![button]],
    }
  }

  /// One button per row, in the given order.
  pub fn column(buttons: impl IntoIterator<Item = InlineButton>) -> Self {
    Self {
      inline_keyboard: buttons.into_iter().map(|b| vec![b]).collect(),
    }
  }

  pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
    self.inline_keyboard.iter().flatten()
  }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
  async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> AppResult<()>;

  async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str, keyboard: Option<Keyboard>)
    -> AppResult<()>;

  /// Replaces the text (and keyboard) of a message the bot sent earlier.
  async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str, keyboard: Option<Keyboard>)
    -> AppResult<()>;

  /// Clears the loading indicator on a pressed button.
  async fn answer_callback(&self, callback_id: &str) -> AppResult<()>;

  /// Points Telegram at `url`; every delivery then carries `secret_token` in a header.
  async fn set_webhook(&self, url: &str, secret_token: &str) -> AppResult<()>;
}
