// vendbot/core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures of the catalog store and order ledger.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Product '{0}' already exists")]
  DuplicateProduct(String),

  #[error("Unknown product '{0}'")]
  UnknownProduct(String),

  #[error("Unknown product field '{0}' (expected name, price or description)")]
  InvalidField(String),

  #[error("Invalid price '{0}': must be a positive integer")]
  InvalidPrice(String),

  #[error("Order '{0}' already exists")]
  DuplicateOrder(String),

  #[error("Storage IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Storage JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Corrupt stored value: {0}")]
  Corrupt(String),
}

/// Failures raised by the pipeline engine itself rather than by a step.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Context type mismatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Error in handler or external operation. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
