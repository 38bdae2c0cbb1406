// lustre/src/workflow/step.rs

//! Defines the structure for a single step within a workflow.

use super::ContextData;

/// Skip predicate evaluated on the workflow context right before the step runs.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

/// Whether a failing step aborts the run or is only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
  /// Failure aborts the workflow and is returned to the caller.
  Primary,
  /// Failure is logged and recorded in `SideEffects`; the run continues.
  BestEffort,
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub mode: StepMode,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> StepDef<T> {
  pub(crate) fn should_skip(&self, ctx_data: &ContextData<T>) -> bool {
    match &self.skip_if {
      Some(cond) => cond(&ctx_data.read()),
      None => false,
    }
  }
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("mode", &self.mode)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
