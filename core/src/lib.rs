// src/lib.rs

//! Lustre: order and refund status lifecycle for the Lustre storefront.
//!
//! The crate provides:
//!  - Typed records for orders, refunds, status history, notifications and
//!    payment-transaction audit rows.
//!  - A small step-workflow engine (`Workflow`) whose steps are either
//!    primary (failure aborts the run) or best-effort (failure is reported
//!    in `SideEffects` and the run continues).
//!  - `OrderStatusController` and `RefundStateController`, built on that engine.
//!  - Ports for persistence (`LifecycleStore`), the payment gateway
//!    (`PaymentGateway`) and bearer-token identity (`IdentityProvider`),
//!    plus in-process implementations for tests and local development.

pub mod error;
pub mod gateway;
pub mod identity;
pub mod lifecycle;
pub mod memory;
pub mod mock;
pub mod model;
pub mod notifier;
pub mod recorder;
pub mod store;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::error::{LifecycleError, LifecycleResult};
pub use crate::gateway::{GatewayError, GatewayRefund, GatewayRefundRequest, PaymentGateway};
pub use crate::identity::{authenticate, authorize_admin, AdminActor, Identity, IdentityProvider};
pub use crate::lifecycle::{
  LifecycleDeps, OrderStatusController, OrderTransition, OrderTransitionOutcome, ProcessRefund, RefundDetail,
  RefundProcessOutcome, RefundRequest, RefundStateController,
};
pub use crate::memory::InMemoryStore;
pub use crate::mock::{MockGateway, StaticIdentityProvider};
pub use crate::notifier::NotificationEmitter;
pub use crate::recorder::StatusHistoryRecorder;
pub use crate::store::{LifecycleStore, RefundCommit, StoreResult};
pub use crate::workflow::{ContextData, Control, SideEffectFailure, SideEffects, StepMode, Workflow, WorkflowResult};
