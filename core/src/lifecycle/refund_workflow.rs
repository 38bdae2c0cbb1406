// lustre/src/lifecycle/refund_workflow.rs

//! Refund State Controller.
//!
//! `process` runs as a step workflow:
//!
//! 1. `validate_refund_request`: the target must be an admin-submittable status.
//! 2. `load_refund`: refund and parent order must exist.
//! 3. `check_refund_transition`: forward-only, never same-status, never out of a terminal status.
//! 4. `gateway_refund`: only when completing a gateway-backed refund. A failure aborts the run
//!    before anything is written.
//! 5. `commit_refund`: refund row, order payment status and audit row land together.
//! 6. `record_refund_history` / `emit_refund_notification`: best-effort, reported in `SideEffects`.

use crate::error::{LifecycleError, LifecycleResult};
use crate::gateway::GatewayRefundRequest;
use crate::lifecycle::contexts::{LifecycleDeps, ProcessRefundCtxData};
use crate::model::{
  to_minor_units, HistorySubject, Notification, PaymentTransaction, Refund, RefundStatus, StatusHistoryEntry,
};
use crate::store::RefundCommit;
use crate::workflow::{ContextData, Control, SideEffects, SkipCondition, StepMode, Workflow, WorkflowResult};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const STEP_VALIDATE_REQUEST: &str = "validate_refund_request";
pub const STEP_LOAD_REFUND: &str = "load_refund";
pub const STEP_CHECK_TRANSITION: &str = "check_refund_transition";
pub const STEP_GATEWAY_REFUND: &str = "gateway_refund";
pub const STEP_COMMIT_REFUND: &str = "commit_refund";
pub const STEP_RECORD_HISTORY: &str = "record_refund_history";
pub const STEP_EMIT_NOTIFICATION: &str = "emit_refund_notification";

/// A customer's refund request against one of their orders.
#[derive(Debug, Clone)]
pub struct RefundRequest {
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub amount: Decimal,
  pub reason: String,
}

/// An admin's decision on a refund.
#[derive(Debug, Clone)]
pub struct ProcessRefund {
  pub refund_id: Uuid,
  pub actor_id: Uuid,
  pub target_status: RefundStatus,
  pub admin_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundProcessOutcome {
  pub refund: Refund,
  pub previous_status: RefundStatus,
  /// Raw gateway payload when money moved in this call.
  pub gateway_response: Option<serde_json::Value>,
  pub side_effects: SideEffects,
}

#[derive(Debug, Clone)]
pub struct RefundDetail {
  pub refund: Refund,
  pub history: Vec<StatusHistoryEntry>,
  pub notifications: Vec<Notification>,
}

pub struct RefundStateController {
  deps: LifecycleDeps,
  workflow: Workflow<ProcessRefundCtxData>,
}

impl RefundStateController {
  pub fn new(deps: LifecycleDeps) -> Self {
    Self {
      deps,
      workflow: build_refund_workflow(),
    }
  }

  /// Opens a `pending` refund. The caller must own the order and may not ask
  /// for more than the order total.
  #[instrument(
    name = "RefundStateController::request_refund",
    skip(self, request),
    fields(order_id = %request.order_id, user_id = %request.user_id, amount = %request.amount),
    err(Display)
  )]
  pub async fn request_refund(&self, request: RefundRequest) -> LifecycleResult<Refund> {
    if request.amount <= Decimal::ZERO {
      return Err(LifecycleError::Validation("refund amount must be greater than zero".to_string()));
    }
    // Amounts are stored as NUMERIC(12,2) and refunded in paise.
    if request.amount.normalize().scale() > 2 {
      return Err(LifecycleError::Validation(format!(
        "refund amount {} has more than two decimal places",
        request.amount
      )));
    }
    let reason = request.reason.trim();
    if reason.is_empty() {
      return Err(LifecycleError::Validation("refund reason is required".to_string()));
    }

    let order = self
      .deps
      .store
      .find_order(request.order_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("order", request.order_id))?;
    if order.user_id != request.user_id {
      warn!("Refund requested by a user who does not own the order.");
      return Err(LifecycleError::Forbidden("order belongs to another customer".to_string()));
    }
    if request.amount > order.total_amount {
      return Err(LifecycleError::Validation(format!(
        "refund amount {} exceeds order total {}",
        request.amount, order.total_amount
      )));
    }

    let refund = Refund::pending(
      order.id,
      request.user_id,
      request.amount,
      order.payment_method.clone(),
      order.gateway_payment_id.clone(),
      reason,
    );
    self.deps.store.insert_refund(&refund).await?;
    info!(refund_id = %refund.id, "Refund request opened.");
    Ok(refund)
  }

  #[instrument(
    name = "RefundStateController::process",
    skip(self, command),
    fields(refund_id = %command.refund_id, actor_id = %command.actor_id, target = %command.target_status),
    err(Display)
  )]
  pub async fn process(&self, command: ProcessRefund) -> LifecycleResult<RefundProcessOutcome> {
    let ctx_data = ContextData::new(ProcessRefundCtxData {
      deps: self.deps.clone(),
      refund_id: command.refund_id,
      actor_id: command.actor_id,
      target_status: command.target_status,
      admin_notes: command.admin_notes.filter(|n| !n.trim().is_empty()),
      refund: None,
      order: None,
      gateway_request: None,
      gateway_response: None,
      updated_refund: None,
    });

    let run = self.workflow.run(ctx_data.clone()).await?;
    if run.result == WorkflowResult::Stopped {
      return Err(LifecycleError::from(anyhow::anyhow!(
        "refund workflow halted before the refund was committed"
      )));
    }

    let finished = ctx_data.into_inner();
    let previous_status = finished
      .refund
      .map(|r| r.status)
      .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("refund workflow finished without loading the refund")))?;
    let refund = finished
      .updated_refund
      .ok_or_else(|| LifecycleError::from(anyhow::anyhow!("refund workflow finished without committing")))?;

    if !run.side_effects.all_succeeded() {
      warn!(
        failures = ?run.side_effects.failures(),
        "Refund committed but some side effects failed."
      );
    }
    Ok(RefundProcessOutcome {
      refund,
      previous_status,
      gateway_response: finished.gateway_response.map(|g| g.raw),
      side_effects: run.side_effects,
    })
  }

  pub async fn refund_detail(&self, refund_id: Uuid) -> LifecycleResult<RefundDetail> {
    let refund = self
      .deps
      .store
      .find_refund(refund_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("refund", refund_id))?;
    let history = self.deps.history.entries(HistorySubject::Refund, refund_id).await?;
    let notifications = self.deps.store.notifications_for_refund(refund_id).await?;
    Ok(RefundDetail {
      refund,
      history,
      notifications,
    })
  }
}

pub fn build_refund_workflow() -> Workflow<ProcessRefundCtxData> {
  let skip_gateway: SkipCondition<ProcessRefundCtxData> =
    Arc::new(|data: &ProcessRefundCtxData| !data.needs_gateway_call());

  let mut wf = Workflow::new(
    "refund_processing",
    &[
      (STEP_VALIDATE_REQUEST, StepMode::Primary, None),
      (STEP_LOAD_REFUND, StepMode::Primary, None),
      (STEP_CHECK_TRANSITION, StepMode::Primary, None),
      (STEP_GATEWAY_REFUND, StepMode::Primary, Some(skip_gateway)),
      (STEP_COMMIT_REFUND, StepMode::Primary, None),
      (STEP_RECORD_HISTORY, StepMode::BestEffort, None),
      (STEP_EMIT_NOTIFICATION, StepMode::BestEffort, None),
    ],
  );
  wf.on(STEP_VALIDATE_REQUEST, validate_refund_request_step);
  wf.on(STEP_LOAD_REFUND, load_refund_step);
  wf.on(STEP_CHECK_TRANSITION, check_refund_transition_step);
  wf.before(STEP_GATEWAY_REFUND, prepare_gateway_request_step);
  wf.on(STEP_GATEWAY_REFUND, call_gateway_step);
  wf.on(STEP_COMMIT_REFUND, commit_refund_step);
  wf.on(STEP_RECORD_HISTORY, record_refund_history_step);
  wf.on(STEP_EMIT_NOTIFICATION, emit_refund_notification_step);
  wf
}

fn missing(what: &str) -> LifecycleError {
  LifecycleError::from(anyhow::anyhow!("refund workflow: {} not available at this step", what))
}

async fn validate_refund_request_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let target = ctx_data.read().target_status;
  if !RefundStatus::ADMIN_TARGETS.contains(&target) {
    return Err(LifecycleError::Validation(format!(
      "status must be one of processing, completed, rejected; got '{}'",
      target
    )));
  }
  Ok(Control::Continue)
}

async fn load_refund_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let (store, refund_id) = {
    let guard = ctx_data.read();
    (guard.deps.store.clone(), guard.refund_id)
  };
  let refund = store
    .find_refund(refund_id)
    .await?
    .ok_or_else(|| LifecycleError::not_found("refund", refund_id))?;
  let order = store
    .find_order(refund.order_id)
    .await?
    .ok_or_else(|| LifecycleError::not_found("order", refund.order_id))?;
  {
    let mut guard = ctx_data.write();
    guard.refund = Some(refund);
    guard.order = Some(order);
  }
  Ok(Control::Continue)
}

async fn check_refund_transition_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let guard = ctx_data.read();
  let refund = guard.refund.as_ref().ok_or_else(|| missing("refund"))?;
  let target = guard.target_status;

  if refund.status == target || !refund.status.can_transition_to(target) {
    warn!(refund_id = %refund.id, from = %refund.status, to = %target, "Refund transition refused.");
    return Err(LifecycleError::invalid_transition("refund", refund.status, target));
  }
  if target == RefundStatus::Completed && !guard.needs_gateway_call() {
    info!(
      refund_id = %refund.id,
      payment_method = %refund.payment_method,
      "Completing refund without a gateway call (not a gateway-backed payment)."
    );
  }
  Ok(Control::Continue)
}

async fn prepare_gateway_request_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let request = {
    let guard = ctx_data.read();
    let refund = guard.refund.as_ref().ok_or_else(|| missing("refund"))?;
    let order = guard.order.as_ref().ok_or_else(|| missing("order"))?;
    let payment_id = refund
      .gateway_payment_for(guard.deps.gateway.method_label())
      .ok_or_else(|| missing("gateway payment id"))?;

    let mut notes = BTreeMap::new();
    notes.insert("reason".to_string(), refund.reason.clone());
    notes.insert("order_id".to_string(), order.id.to_string());
    notes.insert("order_number".to_string(), order.order_number.clone());
    notes.insert("refund_id".to_string(), refund.id.to_string());

    let amount_minor = to_minor_units(refund.amount)?;
    if amount_minor == 0 {
      return Err(LifecycleError::Validation(format!(
        "refund amount {} is below the smallest currency unit",
        refund.amount
      )));
    }

    GatewayRefundRequest {
      payment_id: payment_id.to_string(),
      amount_minor,
      currency: order.currency.clone(),
      idempotency_key: refund.idempotency_key(),
      notes,
    }
  };
  ctx_data.write().gateway_request = Some(request);
  Ok(Control::Continue)
}

async fn call_gateway_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let (gateway, request) = {
    let guard = ctx_data.read();
    let request = guard.gateway_request.clone().ok_or_else(|| missing("gateway request"))?;
    (guard.deps.gateway.clone(), request)
  };

  info!(
    payment_id = %request.payment_id,
    amount_minor = request.amount_minor,
    idempotency_key = %request.idempotency_key,
    "Issuing gateway refund."
  );
  let response = gateway.refund(request).await.map_err(|e| {
    error!(error = %e, "Gateway refund failed; nothing will be persisted.");
    LifecycleError::gateway(e.to_string())
  })?;
  info!(gateway_id = %response.gateway_id, status = %response.status, "Gateway refund accepted.");

  ctx_data.write().gateway_response = Some(response);
  Ok(Control::Continue)
}

async fn commit_refund_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let (store, commit) = {
    let guard = ctx_data.read();
    let refund = guard.refund.as_ref().ok_or_else(|| missing("refund"))?;
    let order = guard.order.as_ref().ok_or_else(|| missing("order"))?;
    let now = Utc::now();
    let completing = guard.target_status == RefundStatus::Completed;

    let transaction = match (&guard.gateway_response, completing) {
      (Some(gateway), true) => Some(PaymentTransaction {
        id: Uuid::new_v4(),
        order_id: order.id,
        refund_id: Some(refund.id),
        kind: "refund".to_string(),
        amount: refund.amount,
        currency: order.currency.clone(),
        gateway_reference: gateway.gateway_id.clone(),
        status: gateway.status.clone(),
        gateway_response: gateway.raw.clone(),
        created_at: now,
      }),
      _ => None,
    };

    let commit = RefundCommit {
      refund_id: refund.id,
      expected_status: refund.status,
      new_status: guard.target_status,
      admin_notes: guard.admin_notes.clone(),
      processed_by: guard.actor_id,
      updated_at: now,
      completed_at: completing.then_some(now),
      gateway_refund_id: guard.gateway_response.as_ref().map(|g| g.gateway_id.clone()),
      mark_order_refunded: completing.then_some(order.id),
      transaction,
    };
    (guard.deps.store.clone(), commit)
  };

  let refund_id = commit.refund_id;
  let expected = commit.expected_status;
  let updated = store
    .commit_refund_transition(commit)
    .await?
    .ok_or_else(|| LifecycleError::Conflict {
      entity: "refund",
      id: refund_id.to_string(),
      expected: expected.to_string(),
    })?;
  info!(refund_id = %updated.id, status = %updated.status, "Refund transition committed.");

  ctx_data.write().updated_refund = Some(updated);
  Ok(Control::Continue)
}

async fn record_refund_history_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let (history, refund_id, previous, target, notes, actor_id) = {
    let guard = ctx_data.read();
    let refund = guard.refund.as_ref().ok_or_else(|| missing("refund"))?;
    (
      guard.deps.history.clone(),
      refund.id,
      refund.status,
      guard.target_status,
      guard.admin_notes.clone(),
      guard.actor_id,
    )
  };
  history
    .record(
      HistorySubject::Refund,
      refund_id,
      previous.as_str(),
      target.as_str(),
      notes,
      Some(actor_id),
    )
    .await?;
  Ok(Control::Continue)
}

async fn emit_refund_notification_step(ctx_data: ContextData<ProcessRefundCtxData>) -> LifecycleResult<Control> {
  let (notifier, refund, currency, target) = {
    let guard = ctx_data.read();
    let refund = guard.updated_refund.clone().ok_or_else(|| missing("committed refund"))?;
    let currency = guard.order.as_ref().ok_or_else(|| missing("order"))?.currency.clone();
    (guard.deps.notifier.clone(), refund, currency, guard.target_status)
  };
  notifier.emit_refund_update(&refund, &currency, target).await?;
  Ok(Control::Continue)
}
