// vendbot/bot/src/services/payment.rs
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::errors::Result as AppResult;
use vendbot_core::{generate_external_id, Product};

/// What the bot asks the provider to bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
  pub external_id: String,
  pub amount: u64,
  pub description: String,
  pub payer_name: String,
}

/// The provider's answer: its own invoice id and the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
  pub id: String,
  pub invoice_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Provider failures surface as `AppError::InvoiceCreation`.
  async fn create_invoice(&self, request: &InvoiceRequest) -> AppResult<Invoice>;
}

/// The chat user paying for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buyer {
  pub user_id: i64,
  pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedInvoice {
  pub payment_url: String,
  pub external_id: String,
}

/// Creates a provider invoice for one unit of `product`. Not retried on failure.
#[instrument(skip(gateway, product, buyer), fields(product_id = %product.id, user_id = buyer.user_id))]
pub async fn issue_invoice(
  gateway: &dyn PaymentGateway,
  order_prefix: &str,
  product: &Product,
  buyer: &Buyer,
) -> AppResult<IssuedInvoice> {
  let external_id = generate_external_id(order_prefix, &product.id, buyer.user_id, Utc::now());
  let request = InvoiceRequest {
    external_id: external_id.clone(),
    amount: product.price,
    description: format!("Purchase of {} by {}", product.name, buyer.full_name),
    payer_name: buyer.full_name.clone(),
  };

  let invoice = gateway.create_invoice(&request).await?;
  info!(%external_id, invoice_id = %invoice.id, "Invoice issued.");
  Ok(IssuedInvoice {
    payment_url: invoice.invoice_url,
    external_id,
  })
}
