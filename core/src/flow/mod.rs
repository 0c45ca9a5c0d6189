// vendbot/core/src/flow/mod.rs

//! A small step-pipeline engine.
//!
//! A `Pipeline<TData, Err>` is a list of named steps. Each step has handlers
//! which receive a clone of a shared `ContextData<TData>`, may mutate it, and
//! signal `StepControl::Continue` or `StepControl::Stop`. Optional steps may
//! have no handler at all.
//! `FlowRegistry` stores pipelines keyed by their context type.

pub mod context;
pub mod control;
pub mod pipeline;
pub mod registry;

pub use context::ContextData;
pub use control::{FlowOutcome, StepControl};
pub use pipeline::{Handler, Pipeline, StepDef};
pub use registry::FlowRegistry;
