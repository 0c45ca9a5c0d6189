// vendbot/bot/src/pipelines/payment_webhook_pipeline.rs

//! Payment notification -> settlement -> buyer and admin notifications.
//!
//! Only the token check may fail the request. Every later problem stops the
//! pipeline or is returned as an error that the HTTP handler logs and still
//! acknowledges, so the provider never retries a processed delivery.

use serde_json::Value as JsonValue;
use tracing::{error, info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::{PaymentNotice, PaymentWebhookCtxData, WebhookAck};
use crate::storefront::messages;
use vendbot_core::{ContextData, FlowRegistry, Pipeline, Settlement, StepControl};

impl PaymentNotice {
  /// Reads `external_id` and `status` from the top level, or one level down under `data`.
  pub fn from_json(payload: &JsonValue) -> Option<Self> {
    let field = |name: &str| {
      payload
        .get(name)
        .and_then(JsonValue::as_str)
        .or_else(|| payload.get("data")?.get(name)?.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    };
    Some(Self {
      external_id: field("external_id")?.to_string(),
      status: field("status")?.to_string(),
    })
  }

  /// `PAID` (invoice callbacks) and `SETTLED` (settled funds) both mean fully paid.
  pub fn is_paid(&self) -> bool {
    self.status.eq_ignore_ascii_case("PAID") || self.status.eq_ignore_ascii_case("SETTLED")
  }
}

pub fn register_payment_webhook_pipeline(flows: &FlowRegistry<AppError>) {
  let mut p = Pipeline::<PaymentWebhookCtxData, AppError>::new(&[
    ("verify_callback_token", false),
    ("parse_payment_notice", false),
    ("check_paid_status", false),
    ("settle_order", false),
    ("notify_buyer", false),
    ("notify_admin", true),
  ]);

  p.on_step("verify_callback_token", verify_callback_token);
  p.on_step("parse_payment_notice", parse_payment_notice);
  p.on_step("check_paid_status", check_paid_status);
  p.on_step("settle_order", settle_order);
  p.on_step("notify_buyer", notify_buyer);
  p.on_step("notify_admin", notify_admin);

  flows.register(p);
  info!("Payment webhook pipeline registered.");
}

#[instrument(name = "webhook_step::verify_callback_token", skip(ctx_data), err)]
async fn verify_callback_token(ctx_data: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let authentic = ctx_data.get(|c| c.callback_token.as_deref() == Some(c.app_state.config.xendit_webhook_token.as_str()));
  if !authentic {
    warn!("Webhook verification failed: callback token mismatch.");
    return Err(AppError::WebhookAuth);
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "webhook_step::parse_payment_notice", skip(ctx_data))]
async fn parse_payment_notice(ctx_data: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let raw_payload = ctx_data.get(|c| c.raw_payload.clone());

  let notice = match serde_json::from_slice::<JsonValue>(&raw_payload) {
    Ok(payload) => PaymentNotice::from_json(&payload),
    Err(e) => {
      warn!(error = %e, bytes = raw_payload.len(), "Webhook body is not JSON.");
      None
    }
  };

  let mut guard = ctx_data.write();
  match notice {
    Some(notice) => {
      info!(external_id = %notice.external_id, status = %notice.status, "Payment notice received.");
      guard.notice = Some(notice);
      Ok(StepControl::Continue)
    }
    None => {
      warn!("Webhook body carries no external_id/status; ignoring.");
      guard.ack = WebhookAck::Ignored;
      Ok(StepControl::Stop)
    }
  }
}

#[instrument(name = "webhook_step::check_paid_status", skip(ctx_data))]
async fn check_paid_status(ctx_data: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let notice = ctx_data.get(|c| c.notice.clone());
  match notice {
    Some(notice) if notice.is_paid() => Ok(StepControl::Continue),
    Some(notice) => {
      info!(external_id = %notice.external_id, status = %notice.status, "Status is not a final payment; nothing to do.");
      Ok(StepControl::Stop)
    }
    None => Err(AppError::Internal("Payment notice missing before status check".to_string())),
  }
}

#[instrument(name = "webhook_step::settle_order", skip(ctx_data), err)]
async fn settle_order(ctx_data: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let (store, external_id) = ctx_data.get(|c| (c.app_state.store.clone(), c.notice.as_ref().map(|n| n.external_id.clone())));
  let external_id =
    external_id.ok_or_else(|| AppError::Internal("Payment notice missing before settlement".to_string()))?;

  match store.settle_order(&external_id).await? {
    Settlement::NotFound => {
      warn!(%external_id, "{}", AppError::OrderNotFound(external_id.clone()));
      Ok(StepControl::Stop)
    }
    Settlement::AlreadyPaid => {
      info!(%external_id, "{}; duplicate delivery ignored.", AppError::AlreadyPaid(external_id.clone()));
      Ok(StepControl::Stop)
    }
    settlement => {
      ctx_data.write().settlement = Some(settlement);
      Ok(StepControl::Continue)
    }
  }
}

#[instrument(name = "webhook_step::notify_buyer", skip(ctx_data))]
async fn notify_buyer(ctx_data: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let (chat, settlement) = ctx_data.get(|c| (c.app_state.chat.clone(), c.settlement.clone()));

  let (user_id, text) = match settlement {
    Some(Settlement::Fulfilled { order, item }) => (order.user_id, messages::fulfilment(&item.detail)),
    Some(Settlement::SoldOut { order }) => (order.user_id, messages::STOCK_UNAVAILABLE.to_string()),
    _ => return Err(AppError::Internal("No settlement to notify about".to_string())),
  };

  // The order is already PAID; a lost message must not keep the admin from hearing about it.
  match chat.send_message(user_id, &text, None).await {
    Ok(()) => {
      ctx_data.write().buyer_notified = true;
      info!(user_id, "Buyer notified.");
    }
    Err(e) => error!(user_id, error = %e, "Could not notify the buyer."),
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "webhook_step::notify_admin", skip(ctx_data), err)]
async fn notify_admin(ctx_data: ContextData<PaymentWebhookCtxData>) -> AppResult<StepControl> {
  let (chat, admin_chat_id, settlement, buyer_notified) = ctx_data.get(|c| {
    (
      c.app_state.chat.clone(),
      c.app_state.config.admin_chat_id,
      c.settlement.clone(),
      c.buyer_notified,
    )
  });

  let mut text = match &settlement {
    Some(Settlement::Fulfilled { order, item }) => messages::admin_sale(order, item),
    Some(Settlement::SoldOut { order }) => {
      warn!(external_id = %order.external_id, "{}", AppError::OutOfStock(order.product_id.clone()));
      messages::admin_shortfall(order)
    }
    _ => return Ok(StepControl::Continue),
  };
  if !buyer_notified {
    text.push_str("\n⚠️ The buyer could not be notified.");
  }

  chat.send_message(admin_chat_id, &text, None).await?;
  Ok(StepControl::Continue)
}
