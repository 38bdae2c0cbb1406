// lustre/src/lifecycle/contexts.rs

//! Workflow state for the order and refund controllers.
//! Steps receive these wrapped in `ContextData`.

use crate::gateway::{GatewayRefund, GatewayRefundRequest, PaymentGateway};
use crate::model::{Order, OrderStatus, Refund, RefundStatus};
use crate::notifier::NotificationEmitter;
use crate::recorder::StatusHistoryRecorder;
use crate::store::LifecycleStore;
use std::sync::Arc;
use uuid::Uuid;

/// Collaborators injected once at startup and shared by every run.
#[derive(Clone)]
pub struct LifecycleDeps {
  pub store: Arc<dyn LifecycleStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub history: StatusHistoryRecorder,
  pub notifier: NotificationEmitter,
}

// --- Order status transition ---

#[derive(Clone)]
pub struct OrderTransitionCtxData {
  pub deps: LifecycleDeps,
  pub order_id: Uuid,
  pub target_status: OrderStatus,
  pub note: Option<String>,
  pub actor_id: Option<Uuid>,
  // Populated by the workflow:
  pub order: Option<Order>,
  pub updated_order: Option<Order>,
}

impl OrderTransitionCtxData {
  pub fn timeline_note(&self) -> String {
    self
      .note
      .clone()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| format!("Status updated to {}", self.target_status))
  }
}

// --- Refund processing ---

#[derive(Clone)]
pub struct ProcessRefundCtxData {
  pub deps: LifecycleDeps,
  pub refund_id: Uuid,
  pub actor_id: Uuid,
  pub target_status: RefundStatus,
  pub admin_notes: Option<String>,
  // Populated by the workflow:
  pub refund: Option<Refund>,
  pub order: Option<Order>,
  pub gateway_request: Option<GatewayRefundRequest>,
  pub gateway_response: Option<GatewayRefund>,
  pub updated_refund: Option<Refund>,
}

impl ProcessRefundCtxData {
  /// True when completing this refund must move money at the gateway first.
  pub fn needs_gateway_call(&self) -> bool {
    self.target_status == RefundStatus::Completed
      && self
        .refund
        .as_ref()
        .and_then(|r| r.gateway_payment_for(self.deps.gateway.method_label()))
        .is_some()
  }
}
