// vendbot/bot/src/pipelines/mod.rs

//! Defines and registers the pipelines used by the bot.

use crate::errors::AppError;
use vendbot_core::FlowRegistry;

pub mod contexts;

pub mod checkout_pipeline;
pub mod payment_webhook_pipeline;

/// Registers every pipeline with `flows`. Called once while building `AppState`.
pub fn register_all_pipelines(flows: &FlowRegistry<AppError>) {
  tracing::info!("Registering pipelines...");

  checkout_pipeline::register_checkout_pipeline(flows);
  payment_webhook_pipeline::register_payment_webhook_pipeline(flows);

  tracing::info!("All application pipelines registered.");
}
