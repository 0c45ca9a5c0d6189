// vendbot/bot/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use vendbot_core::{FlowError, StoreError};

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Invoice Creation Failed: {0}")]
  InvoiceCreation(String),

  #[error("Webhook verification token mismatch")]
  WebhookAuth,

  #[error("Order Not Found: {0}")]
  OrderNotFound(String),

  #[error("Order Already Paid: {0}")]
  AlreadyPaid(String),

  #[error("Out Of Stock: {0}")]
  OutOfStock(String),

  #[error("Chat Transport Error: {0}")]
  Chat(String),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Internal(format!("{:#}", err))
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::WebhookAuth => {
        HttpResponse::Forbidden().json(json!({"status": "error", "message": "Invalid verification token"}))
      }
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"status": "error", "message": m})),
      AppError::OrderNotFound(m) => HttpResponse::NotFound().json(json!({"status": "error", "message": m})),
      AppError::Config(_) => {
        HttpResponse::InternalServerError().json(json!({"status": "error", "message": "Configuration issue"}))
      }
      AppError::Store(_) => {
        HttpResponse::InternalServerError().json(json!({"status": "error", "message": "Storage operation failed"}))
      }
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        HttpResponse::InternalServerError().json(json!({"status": "error", "message": "Workflow processing error"}))
      }
      _ => HttpResponse::InternalServerError().json(json!({"status": "error", "message": "Internal Server Error"})),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
