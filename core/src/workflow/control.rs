// lustre/src/workflow/control.rs

//! Signals for controlling workflow flow and the outcome of a workflow run.

use serde::Serialize;

/// Signal from a step handler indicating whether the workflow should continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// Carry on with the remaining handlers and steps.
  Continue,
  /// Halt the workflow. Nothing after this handler runs.
  Stop,
}

/// How a workflow run ended when no primary step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowResult {
  Completed,
  Stopped,
}

/// A best-effort step that failed after the primary write already stood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffectFailure {
  pub step: String,
  pub error: String,
}

/// Partial-failure report attached to every successful lifecycle operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SideEffects(Vec<SideEffectFailure>);

impl SideEffects {
  pub fn push(&mut self, step: impl Into<String>, error: impl ToString) {
    self.0.push(SideEffectFailure {
      step: step.into(),
      error: error.to_string(),
    });
  }

  pub fn all_succeeded(&self) -> bool {
    self.0.is_empty()
  }

  pub fn failed(&self, step: &str) -> bool {
    self.0.iter().any(|f| f.step == step)
  }

  pub fn failures(&self) -> &[SideEffectFailure] {
    &self.0
  }
}

/// Outcome of `Workflow::run` when no primary step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
  pub result: WorkflowResult,
  pub side_effects: SideEffects,
}
