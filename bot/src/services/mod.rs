// vendbot/bot/src/services/mod.rs

//! Outbound collaborators: the chat transport the bot talks through and the
//! payment provider that issues invoices. Both sit behind traits so the
//! pipelines never depend on a concrete HTTP client.

pub mod chat;
pub mod payment;
pub mod telegram;
pub mod xendit;

pub use chat::{ChatTransport, InlineButton, Keyboard};
pub use payment::{issue_invoice, Buyer, Invoice, InvoiceRequest, IssuedInvoice, PaymentGateway};
pub use telegram::TelegramClient;
pub use xendit::XenditClient;

use std::time::Duration;

use crate::errors::{AppError, Result as AppResult};

/// HTTP client for outbound API calls; a stalled peer fails the call after `timeout`.
pub(crate) fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(timeout)
    .build()
    .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}
