// vendbot/bot/src/web/handlers/telegram_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{error, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::storefront::{self, update::Update};

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Rejects deliveries without the configured secret token with 403 and touches nothing.
/// Authentic updates always get 200: Telegram redelivers anything else, which would replay the update.
#[instrument(name = "handler::telegram_update", skip(app_state, req, body))]
pub async fn telegram_update_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let secret = req.headers().get(SECRET_TOKEN_HEADER).and_then(|h_val| h_val.to_str().ok());
  if secret != Some(app_state.config.telegram_webhook_secret.as_str()) {
    warn!(has_header = secret.is_some(), "Telegram update without a valid secret token.");
    return Err(AppError::WebhookAuth);
  }

  let update = match serde_json::from_slice::<Update>(&body) {
    Ok(update) => update,
    Err(e) => {
      warn!(error = %e, "Unreadable Telegram update.");
      return Ok(HttpResponse::Ok().finish());
    }
  };

  let update_id = update.update_id;
  let chat_id = update.chat_id();
  if let Err(e) = storefront::handle_update(app_state.get_ref(), update).await {
    error!(update_id, error = %e, "Failed to handle Telegram update.");
    // Best effort: tell the user something went wrong.
    if let Some(chat_id) = chat_id {
      if let Err(e) = app_state
        .chat
        .send_message(chat_id, storefront::messages::GENERIC_ERROR, None)
        .await
      {
        warn!(error = %e, "Could not send the error notice.");
      }
    }
  }
  Ok(HttpResponse::Ok().finish())
}
