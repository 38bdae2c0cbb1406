// lustre/src/workflow/definition.rs

//! Contains the `Workflow<TData>` struct, its construction and the
//! registration of `before`/`on`/`after` step handlers.

use crate::error::LifecycleError;
use crate::workflow::context::ContextData;
use crate::workflow::control::Control;
use crate::workflow::step::{SkipCondition, StepDef, StepMode};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler.
///
/// Handlers receive a clone of the shared context and return whether the run
/// continues. They must drop every lock guard before awaiting.
pub type Handler<TData> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<Control, LifecycleError>> + Send>>
    + Send
    + Sync,
>;

/// An ordered list of named steps executed against one `ContextData<TData>`.
pub struct Workflow<TData>
where
  TData: 'static + Send + Sync,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) before: HashMap<String, Vec<Handler<TData>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData>>>,
}

impl<TData> Workflow<TData>
where
  TData: 'static + Send + Sync,
{
  pub fn new(name: &'static str, step_defs: &[(&str, StepMode, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, mode, skip_if)| StepDef {
        name: (*step_name).to_string(),
        mode: *mode,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name,
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name; that is a wiring mistake, not a runtime condition.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "workflow '{}' setup error: step '{}' is not defined",
        self.name, step_name
      );
    }
  }

  fn boxed<F>(handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static) -> Handler<TData>
  where
    F: Future<Output = Result<Control, LifecycleError>> + Send + 'static,
  {
    Box::new(move |ctx_data| Box::pin(handler_fn(ctx_data)))
  }

  /// Registers a guard that runs before the step's `on` handlers.
  pub fn before<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Control, LifecycleError>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    self
      .before
      .entry(step_name.to_string())
      .or_default()
      .push(Self::boxed(handler_fn));
  }

  pub fn on<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Control, LifecycleError>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    self
      .on
      .entry(step_name.to_string())
      .or_default()
      .push(Self::boxed(handler_fn));
  }

  pub fn after<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<Control, LifecycleError>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    self
      .after
      .entry(step_name.to_string())
      .or_default()
      .push(Self::boxed(handler_fn));
  }
}
