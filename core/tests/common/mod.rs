// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Level;
use vendbot_core::{
  CatalogStore, ContextData, FlowError, JsonFileStore, NewOrder, NewProduct, OrderLedger, StepControl,
};

// --- Flow test context and error ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow engine error: {0}")]
  Flow(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

pub type StepFuture = Pin<Box<dyn Future<Output = Result<StepControl, TestError>> + Send>>;

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> impl Fn(ContextData<TestContext>) -> StepFuture + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| -> StepFuture {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok::<_, TestError>(StepControl::Stop);
      }
      Ok(StepControl::Continue)
    })
  }
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> impl Fn(ContextData<TestContext>) -> StepFuture + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| -> StepFuture {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  }
}

// --- Tracing, once per test binary ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Store fixtures ---

/// A file store in a fresh temp dir. Keep the `TempDir` alive for the test's duration.
pub async fn temp_store() -> (TempDir, Arc<JsonFileStore>) {
  let dir = tempfile::tempdir().expect("create temp dir");
  let store = JsonFileStore::open(dir.path()).await.expect("open store");
  (dir, Arc::new(store))
}

pub fn new_product(id: &str, price: u64) -> NewProduct {
  NewProduct {
    id: id.to_string(),
    name: format!("{} premium", id),
    price,
    description: format!("{} account, 30 days", id),
  }
}

/// Adds `id` with one stock item per entry of `details`.
pub async fn seed_product(store: &JsonFileStore, id: &str, price: u64, details: &[&str]) {
  store.add_product(new_product(id, price)).await.expect("add product");
  for detail in details {
    store.add_stock_item(id, detail).await.expect("add stock");
  }
}

pub async fn seed_order(store: &JsonFileStore, external_id: &str, user_id: i64, product_id: &str, price: u64) {
  store
    .create_order(NewOrder {
      external_id: external_id.to_string(),
      user_id,
      product_id: product_id.to_string(),
      price,
    })
    .await
    .expect("create order");
}
