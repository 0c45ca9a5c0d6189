// vendbot/core/src/flow/control.rs

//! Signals for controlling flow execution and the outcome of a run.

/// Returned by a step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Carry on with the remaining handlers and steps.
  Continue,
  /// Halt the whole flow. Nothing after this handler runs.
  Stop,
}

/// Outcome of a full flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every step ran (or was skipped) without a handler asking to stop.
  Completed,
  /// A handler returned `StepControl::Stop`.
  Stopped,
}
