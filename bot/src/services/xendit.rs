// vendbot/bot/src/services/xendit.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::payment::{Invoice, InvoiceRequest, PaymentGateway};
use crate::errors::{AppError, Result as AppResult};

#[derive(Debug, Serialize)]
struct CreateInvoiceBody<'a> {
  external_id: &'a str,
  amount: u64,
  description: &'a str,
  customer: Customer<'a>,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
  given_names: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
  id: String,
  invoice_url: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Xendit Invoices API client (`POST /v2/invoices`, basic auth with the secret key).
#[derive(Clone)]
pub struct XenditClient {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

impl XenditClient {
  pub fn new(base_url: &str, api_key: &str) -> AppResult<Self> {
    Ok(Self {
      client: super::http_client(REQUEST_TIMEOUT)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key: api_key.to_string(),
    })
  }
}

#[async_trait]
impl PaymentGateway for XenditClient {
  #[instrument(skip(self, request), fields(external_id = %request.external_id, amount = request.amount))]
  async fn create_invoice(&self, request: &InvoiceRequest) -> AppResult<Invoice> {
    let body = CreateInvoiceBody {
      external_id: &request.external_id,
      amount: request.amount,
      description: &request.description,
      customer: Customer {
        given_names: &request.payer_name,
      },
    };

    let response = self
      .client
      .post(format!("{}/v2/invoices", self.base_url))
      .basic_auth(&self.api_key, Some(""))
      .json(&body)
      .send()
      .await
      .map_err(|e| AppError::InvoiceCreation(format!("Xendit request failed: {}", e)))?;

    if !response.status().is_success() {
      let status = response.status();
      let error_text = response.text().await.unwrap_or_default();
      warn!(%status, "Xendit API error: {}", error_text);
      return Err(AppError::InvoiceCreation(format!("Xendit error ({}): {}", status, error_text)));
    }

    let invoice: InvoiceResponse = response
      .json()
      .await
      .map_err(|e| AppError::InvoiceCreation(format!("Failed to parse Xendit response: {}", e)))?;

    info!(invoice_id = %invoice.id, "Xendit invoice created.");
    Ok(Invoice {
      id: invoice.id,
      invoice_url: invoice.invoice_url,
    })
  }
}
