// lustre/src/lifecycle/order_workflow.rs

//! Order Status Controller: moves an order between fulfilment statuses and
//! appends the transition to the order timeline.

use crate::error::{LifecycleError, LifecycleResult};
use crate::lifecycle::contexts::{LifecycleDeps, OrderTransitionCtxData};
use crate::model::{HistorySubject, Order, OrderStatus, StatusHistoryEntry};
use crate::workflow::{ContextData, Control, SideEffects, StepMode, Workflow, WorkflowResult};
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const STEP_LOAD_ORDER: &str = "load_order";
pub const STEP_CHECK_TRANSITION: &str = "check_order_transition";
pub const STEP_PERSIST_STATUS: &str = "persist_order_status";
pub const STEP_RECORD_TIMELINE: &str = "record_order_timeline";

#[derive(Debug, Clone)]
pub struct OrderTransition {
  pub order_id: Uuid,
  pub target_status: OrderStatus,
  pub note: Option<String>,
  pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct OrderTransitionOutcome {
  pub order: Order,
  pub previous_status: OrderStatus,
  pub side_effects: SideEffects,
}

pub struct OrderStatusController {
  deps: LifecycleDeps,
  workflow: Workflow<OrderTransitionCtxData>,
}

impl OrderStatusController {
  pub fn new(deps: LifecycleDeps) -> Self {
    Self {
      deps,
      workflow: build_order_workflow(),
    }
  }

  /// Any status may follow any other; only a same-status request is refused.
  #[instrument(
    name = "OrderStatusController::transition",
    skip(self, request),
    fields(order_id = %request.order_id, target = %request.target_status),
    err(Display)
  )]
  pub async fn transition(&self, request: OrderTransition) -> LifecycleResult<OrderTransitionOutcome> {
    let ctx_data = ContextData::new(OrderTransitionCtxData {
      deps: self.deps.clone(),
      order_id: request.order_id,
      target_status: request.target_status,
      note: request.note,
      actor_id: request.actor_id,
      order: None,
      updated_order: None,
    });

    let run = self.workflow.run(ctx_data.clone()).await?;
    if run.result == WorkflowResult::Stopped {
      return Err(LifecycleError::from(anyhow::anyhow!(
        "order workflow halted before the status was persisted"
      )));
    }

    let finished = ctx_data.into_inner();
    let previous_status = finished
      .order
      .map(|o| o.status)
      .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("order workflow finished without loading the order")))?;
    let order = finished
      .updated_order
      .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("order workflow finished without persisting the order")))?;

    info!(
      previous = %previous_status,
      current = %order.status,
      side_effects_ok = run.side_effects.all_succeeded(),
      "Order status transitioned."
    );
    Ok(OrderTransitionOutcome {
      order,
      previous_status,
      side_effects: run.side_effects,
    })
  }

  pub async fn timeline(&self, order_id: Uuid) -> LifecycleResult<Vec<StatusHistoryEntry>> {
    self.deps.history.entries(HistorySubject::Order, order_id).await
  }
}

pub fn build_order_workflow() -> Workflow<OrderTransitionCtxData> {
  let mut wf = Workflow::new(
    "order_status_transition",
    &[
      (STEP_LOAD_ORDER, StepMode::Primary, None),
      (STEP_CHECK_TRANSITION, StepMode::Primary, None),
      (STEP_PERSIST_STATUS, StepMode::Primary, None),
      (STEP_RECORD_TIMELINE, StepMode::BestEffort, None),
    ],
  );
  wf.on(STEP_LOAD_ORDER, load_order_step);
  wf.on(STEP_CHECK_TRANSITION, check_order_transition_step);
  wf.on(STEP_PERSIST_STATUS, persist_order_status_step);
  wf.on(STEP_RECORD_TIMELINE, record_order_timeline_step);
  wf
}

async fn load_order_step(ctx_data: ContextData<OrderTransitionCtxData>) -> LifecycleResult<Control> {
  let (store, order_id) = {
    let guard = ctx_data.read();
    (guard.deps.store.clone(), guard.order_id)
  };
  let order = store
    .find_order(order_id)
    .await?
    .ok_or_else(|| LifecycleError::not_found("order", order_id))?;
  ctx_data.write().order = Some(order);
  Ok(Control::Continue)
}

async fn check_order_transition_step(ctx_data: ContextData<OrderTransitionCtxData>) -> LifecycleResult<Control> {
  let guard = ctx_data.read();
  let current = guard
    .order
    .as_ref()
    .map(|o| o.status)
    .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("order not loaded before transition check")))?;
  if current == guard.target_status {
    warn!(order_id = %guard.order_id, status = %current, "Order is already in the requested status.");
    return Err(LifecycleError::invalid_transition("order", current, guard.target_status));
  }
  Ok(Control::Continue)
}

async fn persist_order_status_step(ctx_data: ContextData<OrderTransitionCtxData>) -> LifecycleResult<Control> {
  let (store, order_id, expected, target) = {
    let guard = ctx_data.read();
    let expected = guard
      .order
      .as_ref()
      .map(|o| o.status)
      .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("order not loaded before persisting")))?;
    (guard.deps.store.clone(), guard.order_id, expected, guard.target_status)
  };

  let updated = store
    .update_order_status(order_id, expected, target, Utc::now())
    .await?
    .ok_or_else(|| LifecycleError::Conflict {
      entity: "order",
      id: order_id.to_string(),
      expected: expected.to_string(),
    })?;
  ctx_data.write().updated_order = Some(updated);
  Ok(Control::Continue)
}

async fn record_order_timeline_step(ctx_data: ContextData<OrderTransitionCtxData>) -> LifecycleResult<Control> {
  let (history, order_id, previous, target, note, actor_id) = {
    let guard = ctx_data.read();
    let previous = guard
      .order
      .as_ref()
      .map(|o| o.status)
      .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("order not loaded before recording timeline")))?;
    (
      guard.deps.history.clone(),
      guard.order_id,
      previous,
      guard.target_status,
      guard.timeline_note(),
      guard.actor_id,
    )
  };
  history
    .record(
      HistorySubject::Order,
      order_id,
      previous.as_str(),
      target.as_str(),
      Some(note),
      actor_id,
    )
    .await?;
  Ok(Control::Continue)
}
