// lustre/src/workflow/execution.rs

//! Contains `Workflow::run()`, which executes steps in order and separates
//! primary failures (fatal) from best-effort failures (reported).

use crate::error::LifecycleError;
use crate::workflow::context::ContextData;
use crate::workflow::control::{Control, SideEffects, WorkflowResult, WorkflowRun};
use crate::workflow::definition::{Handler, Workflow};
use crate::workflow::step::StepMode;
use tracing::{event, instrument, span, Instrument, Level};

enum PhaseOutcome {
  Continue,
  Stop,
  Failed(LifecycleError),
}

impl<TData> Workflow<TData>
where
  TData: 'static + Send + Sync,
{
  /// Executes every step against `ctx_data`.
  ///
  /// Returns `Err` as soon as a `Primary` step fails. `BestEffort` failures
  /// are collected into `WorkflowRun::side_effects` and the run carries on
  /// with the next step.
  #[instrument(
    name = "Workflow::run",
    skip_all,
    fields(workflow = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<WorkflowRun, LifecycleError> {
    let mut side_effects = SideEffects::default();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "workflow_step",
        step_name = step_name,
        step_index = step_idx,
        mode = ?step_def.mode
      );

      if step_def.should_skip(&ctx_data) {
        event!(parent: &step_span, Level::DEBUG, "Step skipped by its skip condition.");
        continue;
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];

      if phases.iter().all(|(_, handlers)| handlers.map_or(true, |v| v.is_empty())) {
        match step_def.mode {
          StepMode::BestEffort => {
            event!(parent: &step_span, Level::DEBUG, "Best-effort step has no handlers, skipping.");
            continue;
          }
          StepMode::Primary => {
            event!(parent: &step_span, Level::ERROR, "Primary step has no handlers.");
            return Err(LifecycleError::HandlerMissing {
              step_name: step_def.name.clone(),
            });
          }
        }
      }

      let mut step_outcome = PhaseOutcome::Continue;
      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        step_outcome = run_phase(phase, handlers, &ctx_data)
          .instrument(step_span.clone())
          .await;
        if !matches!(step_outcome, PhaseOutcome::Continue) {
          break;
        }
      }

      match step_outcome {
        PhaseOutcome::Continue => {
          event!(parent: &step_span, Level::DEBUG, "Step finished.");
        }
        PhaseOutcome::Stop => {
          event!(parent: &step_span, Level::INFO, "Workflow stopped by a handler.");
          return Ok(WorkflowRun {
            result: WorkflowResult::Stopped,
            side_effects,
          });
        }
        PhaseOutcome::Failed(err) => match step_def.mode {
          StepMode::Primary => return Err(err),
          StepMode::BestEffort => {
            event!(parent: &step_span, Level::WARN, error = %err, "Best-effort step failed; continuing.");
            side_effects.push(step_name, &err);
          }
        },
      }
    }

    Ok(WorkflowRun {
      result: WorkflowResult::Completed,
      side_effects,
    })
  }
}

async fn run_phase<TData>(phase: &'static str, handlers: &[Handler<TData>], ctx_data: &ContextData<TData>) -> PhaseOutcome
where
  TData: 'static + Send + Sync,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let outcome = handler_fn(ctx_data.clone())
      .instrument(span!(Level::DEBUG, "step_handler", phase, handler_index = handler_idx))
      .await;
    match outcome {
      Ok(Control::Continue) => {}
      Ok(Control::Stop) => return PhaseOutcome::Stop,
      Err(e) => {
        event!(Level::DEBUG, phase, error = %e, "Handler failed.");
        return PhaseOutcome::Failed(e);
      }
    }
  }
  PhaseOutcome::Continue
}
