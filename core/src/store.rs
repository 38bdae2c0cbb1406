// lustre/src/store.rs

//! Persistence port for the lifecycle tables.
//!
//! Implementations decode rows into the typed records of `crate::model` and
//! report failures as `anyhow::Error`; the controllers turn those into
//! `LifecycleError::Internal`.

use crate::model::{
  AdminAccount, HistorySubject, Notification, Order, OrderStatus, PaymentTransaction, Refund, RefundStatus,
  StatusHistoryEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub type StoreResult<T> = anyhow::Result<T>;

/// Everything `commit_refund_transition` must write as one unit.
#[derive(Debug, Clone)]
pub struct RefundCommit {
  pub refund_id: Uuid,
  /// Compare-and-set guard: the status read before the transition was validated.
  pub expected_status: RefundStatus,
  pub new_status: RefundStatus,
  pub admin_notes: Option<String>,
  pub processed_by: Uuid,
  pub updated_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub gateway_refund_id: Option<String>,
  /// Set when the refund completes: the parent order's payment status flips to refunded.
  pub mark_order_refunded: Option<Uuid>,
  pub transaction: Option<PaymentTransaction>,
}

#[async_trait]
pub trait LifecycleStore: Send + Sync {
  async fn insert_order(&self, order: &Order) -> StoreResult<()>;

  async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>>;

  /// Writes `status` and `updated_at` only if the row still holds `expected`.
  /// Returns `None` when the compare-and-set lost.
  async fn update_order_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    new_status: OrderStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>>;

  async fn insert_refund(&self, refund: &Refund) -> StoreResult<()>;

  async fn find_refund(&self, refund_id: Uuid) -> StoreResult<Option<Refund>>;

  /// Applies a refund transition atomically: the refund row, the parent
  /// order's payment status and the payment-transaction audit row either all
  /// land or none do. Returns `None` when the compare-and-set lost.
  async fn commit_refund_transition(&self, commit: RefundCommit) -> StoreResult<Option<Refund>>;

  async fn append_history(&self, entry: &StatusHistoryEntry) -> StoreResult<()>;

  async fn history(&self, subject: HistorySubject, subject_id: Uuid) -> StoreResult<Vec<StatusHistoryEntry>>;

  async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;

  async fn notifications_for_refund(&self, refund_id: Uuid) -> StoreResult<Vec<Notification>>;

  async fn payment_transactions_for_order(&self, order_id: Uuid) -> StoreResult<Vec<PaymentTransaction>>;

  async fn find_admin(&self, user_id: Uuid) -> StoreResult<Option<AdminAccount>>;
}
