// vendbot/bot/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::{ChatTransport, PaymentGateway};
use std::sync::Arc;
use vendbot_core::{FlowRegistry, Store};

/// Everything a request handler or pipeline step needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub chat: Arc<dyn ChatTransport>,
  pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
  /// Wires the collaborators together and registers every pipeline.
  pub fn new(
    config: AppConfig,
    store: Arc<dyn Store>,
    chat: Arc<dyn ChatTransport>,
    payments: Arc<dyn PaymentGateway>,
  ) -> Self {
    let flows = Arc::new(FlowRegistry::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      store,
      flows,
      config: Arc::new(config),
      chat,
      payments,
    }
  }
}
