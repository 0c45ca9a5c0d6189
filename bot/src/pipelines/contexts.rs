// vendbot/bot/src/pipelines/contexts.rs

//! Data structs the pipelines run over. Handlers receive them wrapped in
//! `vendbot_core::ContextData`.

use crate::services::{Buyer, IssuedInvoice};
use crate::state::AppState;
use actix_web::web::Bytes;
use vendbot_core::{Order, Product, Settlement};

/// A buyer picked a product from the catalog keyboard.
#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub chat_id: i64,
  /// The catalog message to edit in place; `None` sends fresh messages instead.
  pub message_id: Option<i64>,
  pub buyer: Buyer,
  pub product_id: String,
  // Filled in by the pipeline:
  pub product: Option<Product>,
  pub invoice: Option<IssuedInvoice>,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, chat_id: i64, message_id: Option<i64>, buyer: Buyer, product_id: String) -> Self {
    Self {
      app_state,
      chat_id,
      message_id,
      buyer,
      product_id,
      product: None,
      invoice: None,
      order: None,
    }
  }
}

/// `external_id` and `status` of a provider notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
  pub external_id: String,
  pub status: String,
}

/// What the webhook answers once the token checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
  Success,
  /// The body was not a payment notice we could read.
  Ignored,
}

/// One inbound payment notification.
#[derive(Clone)]
pub struct PaymentWebhookCtxData {
  pub app_state: AppState,
  pub callback_token: Option<String>,
  pub raw_payload: Bytes,
  // Filled in by the pipeline:
  pub notice: Option<PaymentNotice>,
  pub settlement: Option<Settlement>,
  pub buyer_notified: bool,
  pub ack: WebhookAck,
}

impl PaymentWebhookCtxData {
  pub fn new(app_state: AppState, callback_token: Option<String>, raw_payload: Bytes) -> Self {
    Self {
      app_state,
      callback_token,
      raw_payload,
      notice: None,
      settlement: None,
      buyer_notified: false,
      ack: WebhookAck::Success,
    }
  }
}
