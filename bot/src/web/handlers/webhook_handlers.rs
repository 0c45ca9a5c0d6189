// vendbot/bot/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::pipelines::contexts::{PaymentWebhookCtxData, WebhookAck};
use crate::state::AppState;
use vendbot_core::{ContextData, FlowOutcome};

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let callback_token = req
    .headers()
    .get(CALLBACK_TOKEN_HEADER)
    .and_then(|h_val| h_val.to_str().ok())
    .map(String::from);

  let ctx_data = ContextData::new(PaymentWebhookCtxData::new(
    app_state.get_ref().clone(),
    callback_token,
    body,
  ));

  match app_state.flows.run(ctx_data.clone()).await {
    // The only failure surfaced to the provider.
    Err(AppError::WebhookAuth) => Err(AppError::WebhookAuth),
    Err(app_err) => {
      // Past authentication the delivery counts as processed; a retry would not help.
      error!(error = %app_err, "Payment webhook failed after authentication; acknowledging.");
      Ok(HttpResponse::Ok().json(json!({"status": "success"})))
    }
    Ok(outcome) => {
      let ack = ctx_data.get(|c| c.ack);
      info!(?outcome, ?ack, "Payment webhook processed.");
      Ok(match (outcome, ack) {
        (FlowOutcome::Stopped, WebhookAck::Ignored) => HttpResponse::Ok().json(json!({"status": "ignored"})),
        _ => HttpResponse::Ok().json(json!({"status": "success"})),
      })
    }
  }
}
