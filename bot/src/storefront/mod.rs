// vendbot/bot/src/storefront/mod.rs

//! The chat command surface: one inbound update in, zero or more outbound
//! messages out.
//!
//! Buyers use `/start`, the `browse` button and the per-product `order:{id}`
//! buttons. The admin (the configured chat id) manages the catalog with slash
//! commands. Nothing here reads and rewrites stock on its own; checkout goes
//! through the checkout pipeline and admin commands through the store API.

pub mod admin;
pub mod commands;
pub mod messages;
pub mod update;

use tracing::{info, instrument, warn};

use crate::errors::Result as AppResult;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::{Buyer, ChatTransport, InlineButton, Keyboard};
use crate::state::AppState;
use commands::{parse_command, AdminCommand, ChatCommand};
use update::{CallbackQuery, Message, Update};
use vendbot_core::ContextData;

/// Edits `message_id` in place when known, otherwise sends a new message.
pub async fn show(
  chat: &dyn ChatTransport,
  chat_id: i64,
  message_id: Option<i64>,
  text: &str,
  keyboard: Option<Keyboard>,
) -> AppResult<()> {
  match message_id {
    Some(message_id) => chat.edit_message(chat_id, message_id, text, keyboard).await,
    None => chat.send_message(chat_id, text, keyboard).await,
  }
}

#[instrument(skip_all, fields(update_id = update.update_id))]
pub async fn handle_update(state: &AppState, update: Update) -> AppResult<()> {
  if let Some(query) = update.callback_query {
    return handle_callback(state, query).await;
  }
  match update.message {
    Some(message) => handle_message(state, message).await,
    None => {
      info!("Update carries neither a message nor a callback; ignored.");
      Ok(())
    }
  }
}

async fn handle_message(state: &AppState, message: Message) -> AppResult<()> {
  let chat_id = message.chat.id;
  let Some(text) = message.text.as_deref() else {
    return Ok(());
  };

  match parse_command(text) {
    ChatCommand::Start => send_welcome(state, chat_id).await,
    ChatCommand::Admin { name, args } => {
      let sender_id = message.sender_id();
      if sender_id != state.config.admin_chat_id {
        warn!(sender_id, command = name, "Admin command from a non-admin.");
        return state.chat.send_message(chat_id, messages::ADMIN_ONLY, None).await;
      }
      let reply = match AdminCommand::parse(name, args) {
        Ok(command) => match admin::run_admin_command(state.store.as_ref(), command).await {
          Ok(reply) => reply,
          Err(e) => {
            warn!(command = name, error = %e, "Admin command failed.");
            messages::store_error(&e)
          }
        },
        Err(usage) => usage.to_string(),
      };
      state.chat.send_message(chat_id, &reply, None).await
    }
    ChatCommand::Unknown => state.chat.send_message(chat_id, messages::HELP, None).await,
  }
}

async fn send_welcome(state: &AppState, chat_id: i64) -> AppResult<()> {
  let text = messages::welcome(&state.config.store_name);
  let keyboard = Keyboard::single(InlineButton::new(messages::BROWSE_BUTTON, messages::BROWSE_CALLBACK));
  match &state.config.logo_url {
    Some(logo_url) => state.chat.send_photo(chat_id, logo_url, &text, Some(keyboard)).await,
    None => state.chat.send_message(chat_id, &text, Some(keyboard)).await,
  }
}

async fn handle_callback(state: &AppState, query: CallbackQuery) -> AppResult<()> {
  if let Err(e) = state.chat.answer_callback(&query.id).await {
    warn!(error = %e, "Could not answer callback query.");
  }

  let chat_id = query.message.as_ref().map_or(query.from.id, |m| m.chat.id);
  let message_id = query.message.as_ref().map(|m| m.message_id);
  let data = query.data.as_deref().unwrap_or_default();

  if data == messages::BROWSE_CALLBACK {
    return show_catalog(state, chat_id, message_id).await;
  }
  if let Some(product_id) = data.strip_prefix(messages::ORDER_CALLBACK_PREFIX) {
    let buyer = Buyer {
      user_id: query.from.id,
      full_name: query.from.full_name(),
    };
    let ctx = CheckoutCtxData::new(state.clone(), chat_id, message_id, buyer, product_id.to_string());
    let outcome = state.flows.run(ContextData::new(ctx)).await?;
    info!(%product_id, ?outcome, "Checkout finished.");
    return Ok(());
  }

  warn!(data, "Unrecognised callback data.");
  Ok(())
}

/// Lists every product that still has stock, one button per product.
async fn show_catalog(state: &AppState, chat_id: i64, message_id: Option<i64>) -> AppResult<()> {
  let mut buttons = Vec::new();
  for product in state.store.list_products().await? {
    if state.store.available_stock(&product.id).await? > 0 {
      buttons.push(InlineButton::new(
        messages::product_label(&product),
        format!("{}{}", messages::ORDER_CALLBACK_PREFIX, product.id),
      ));
    }
  }

  if buttons.is_empty() {
    return show(state.chat.as_ref(), chat_id, message_id, messages::ALL_SOLD_OUT, None).await;
  }
  show(
    state.chat.as_ref(),
    chat_id,
    message_id,
    messages::CHOOSE_PRODUCT,
    Some(Keyboard::column(buttons)),
  )
  .await
}
