// vendbot/core/src/flow/pipeline.rs

//! The `Pipeline<TData, Err>` type: an ordered list of named steps, each with
//! its handlers, executed against one shared `ContextData<TData>`.

use crate::error::FlowError;
use crate::flow::context::ContextData;
use crate::flow::control::{FlowOutcome, StepControl};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{event, instrument, span, Instrument, Level};

/// A boxed async step handler.
///
/// Handlers take a clone of the shared context, lock it only briefly, and
/// resolve to `StepControl::Continue` or `StepControl::Stop`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>>
    + Send
    + Sync,
>;

#[derive(Debug, Clone)]
pub struct StepDef {
  pub name: String,
  /// An optional step without handlers is passed over instead of failing the run.
  pub optional: bool,
}

pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  steps: Vec<StepDef>,
  on: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, in execution order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
      })
      .collect();

    Self {
      steps,
      on: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name: a typo here is a wiring bug found at startup.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Pipeline setup error: step '{}' is not defined.", step_name);
    }
  }

  /// Registers a handler; handlers of one step run in registration order. The handler's own error type only needs to
  /// convert into the pipeline's `Err`.
  pub fn on_step<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::box_handler(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  fn box_handler<F, HandlerErr>(
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Handler<TData, Err>
  where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    Box::new(move |ctx_data| {
      let fut = handler_fn(ctx_data);
      Box::pin(async move { fut.await.map_err(Into::into) })
    })
  }

  /// Executes every step in order against `ctx_data`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      let Some(handlers) = self.on.get(step_name).filter(|v| !v.is_empty()) else {
        if step_def.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Required step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      };

      let step_span = span!(Level::INFO, "pipeline_step", step_name, step_index = step_idx);

      for handler_fn in handlers {
        match handler_fn(ctx_data.clone()).instrument(step_span.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Stop) => {
            event!(Level::INFO, step = step_name, "Pipeline stopped by handler.");
            return Ok(FlowOutcome::Stopped);
          }
          Err(e) => {
            event!(Level::ERROR, step = step_name, error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, "Pipeline completed.");
    Ok(FlowOutcome::Completed)
  }
}
