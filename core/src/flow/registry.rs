// vendbot/core/src/flow/registry.rs

//! `FlowRegistry<E>`: pipelines keyed by the type of their context data, so a
//! caller only needs to build the context to pick the right pipeline.

use crate::error::FlowError;
use crate::flow::context::ContextData;
use crate::flow::control::FlowOutcome;
use crate::flow::pipeline::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
}

struct TypedRunner<TData, HandlerErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, HandlerErr>>,
}

#[async_trait]
impl<TData, HandlerErr, AppErr> ErasedRunner<AppErr> for TypedRunner<TData, HandlerErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        return Err(AppErr::from(FlowError::TypeMismatch {
          expected_type: std::any::type_name::<ContextData<TData>>().to_string(),
        }))
      }
    };
    self.pipeline.run(ctx_data).await.map_err(AppErr::from)
  }
}

/// Holds one pipeline per context type and runs them on demand.
pub struct FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  runners: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
  _app_err: PhantomData<AppErr>,
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: RwLock::new(HashMap::new()),
      _app_err: PhantomData,
    }
  }

  /// Registers `pipeline` for contexts of type `TData`, replacing any earlier one.
  pub fn register<TData, HandlerErr>(&self, pipeline: Pipeline<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<TData>(), steps = ?pipeline.step_names(), "Registering pipeline.");
    let runner = TypedRunner {
      pipeline: Arc::new(pipeline),
    };
    self.runners.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  /// Runs the pipeline registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.runners.read().get(&TypeId::of::<TData>()).cloned();
    let runner = runner.ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No pipeline registered for {}.", type_name);
      AppErr::from(FlowError::ConfigurationError {
        step_name: "FlowRegistry::run".to_string(),
        message: format!("No pipeline registered for {}", type_name),
      })
    })?;
    runner.run_erased(Box::new(ctx_data)).await
  }
}
