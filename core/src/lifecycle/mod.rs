// lustre/src/lifecycle/mod.rs

//! The two status controllers and the workflow state they run on.

use crate::gateway::PaymentGateway;
use crate::model::NotificationChannel;
use crate::notifier::NotificationEmitter;
use crate::recorder::StatusHistoryRecorder;
use crate::store::LifecycleStore;
use std::sync::Arc;

pub mod contexts;
pub mod order_workflow;
pub mod refund_workflow;

pub use contexts::LifecycleDeps;
pub use order_workflow::{OrderStatusController, OrderTransition, OrderTransitionOutcome};
pub use refund_workflow::{ProcessRefund, RefundDetail, RefundProcessOutcome, RefundRequest, RefundStateController};

impl LifecycleDeps {
  /// Wires the recorder and emitter over the same store the controllers use.
  pub fn new(
    store: Arc<dyn LifecycleStore>,
    gateway: Arc<dyn PaymentGateway>,
    notification_channel: NotificationChannel,
  ) -> Self {
    Self {
      history: StatusHistoryRecorder::new(store.clone()),
      notifier: NotificationEmitter::new(store.clone(), notification_channel),
      store,
      gateway,
    }
  }
}
