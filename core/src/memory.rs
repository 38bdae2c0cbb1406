// lustre/src/memory.rs

//! In-process `LifecycleStore` used by tests, benchmarks and `STORE_BACKEND=memory`.
//!
//! A single mutex guards all tables, so `commit_refund_transition` is atomic
//! the same way the Postgres transaction is. History and notification writes
//! can be made to fail on demand to exercise best-effort reporting.

use crate::model::{
  AdminAccount, HistorySubject, Notification, Order, OrderStatus, PaymentStatus, PaymentTransaction, Refund,
  RefundStatus, StatusHistoryEntry,
};
use crate::store::{LifecycleStore, RefundCommit, StoreResult};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  orders: HashMap<Uuid, Order>,
  refunds: HashMap<Uuid, Refund>,
  history: Vec<StatusHistoryEntry>,
  notifications: Vec<Notification>,
  transactions: Vec<PaymentTransaction>,
  admins: HashMap<Uuid, AdminAccount>,
  /// Status a "concurrent writer" installs right before the next refund commit.
  refund_race: Option<RefundStatus>,
  order_race: Option<OrderStatus>,
}

#[derive(Default)]
pub struct InMemoryStore {
  tables: Mutex<Tables>,
  fail_history: AtomicBool,
  fail_notifications: AtomicBool,
  fail_commits: AtomicBool,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_admin(&self, account: AdminAccount) {
    self.tables.lock().admins.insert(account.user_id, account);
  }

  pub fn fail_history_writes(&self, fail: bool) {
    self.fail_history.store(fail, Ordering::SeqCst);
  }

  pub fn fail_notification_writes(&self, fail: bool) {
    self.fail_notifications.store(fail, Ordering::SeqCst);
  }

  pub fn fail_refund_commits(&self, fail: bool) {
    self.fail_commits.store(fail, Ordering::SeqCst);
  }

  /// Overwrites a refund's status behind the controller's back, as a
  /// concurrent writer would.
  pub fn force_refund_status(&self, refund_id: Uuid, status: RefundStatus) {
    if let Some(refund) = self.tables.lock().refunds.get_mut(&refund_id) {
      refund.status = status;
    }
  }

  /// Makes the next refund commit find `status` on the row, as if another
  /// admin had committed between our read and our write.
  pub fn race_next_refund_commit(&self, status: RefundStatus) {
    self.tables.lock().refund_race = Some(status);
  }

  /// Same as `race_next_refund_commit`, for the next order status update.
  pub fn race_next_order_update(&self, status: OrderStatus) {
    self.tables.lock().order_race = Some(status);
  }

  pub fn history_len(&self) -> usize {
    self.tables.lock().history.len()
  }

  pub fn notification_len(&self) -> usize {
    self.tables.lock().notifications.len()
  }
}

#[async_trait]
impl LifecycleStore for InMemoryStore {
  async fn insert_order(&self, order: &Order) -> StoreResult<()> {
    let mut tables = self.tables.lock();
    if tables.orders.contains_key(&order.id) {
      bail!("order {} already exists", order.id);
    }
    tables.orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn update_order_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    new_status: OrderStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    let mut tables = self.tables.lock();
    let race = tables.order_race.take();
    let order = tables
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| anyhow!("order {} vanished during update", order_id))?;
    if let Some(status) = race {
      order.status = status;
    }
    if order.status != expected {
      return Ok(None);
    }
    order.status = new_status;
    order.updated_at = updated_at;
    Ok(Some(order.clone()))
  }

  async fn insert_refund(&self, refund: &Refund) -> StoreResult<()> {
    let mut tables = self.tables.lock();
    if !tables.orders.contains_key(&refund.order_id) {
      bail!("refund {} references unknown order {}", refund.id, refund.order_id);
    }
    tables.refunds.insert(refund.id, refund.clone());
    Ok(())
  }

  async fn find_refund(&self, refund_id: Uuid) -> StoreResult<Option<Refund>> {
    Ok(self.tables.lock().refunds.get(&refund_id).cloned())
  }

  async fn commit_refund_transition(&self, commit: RefundCommit) -> StoreResult<Option<Refund>> {
    if self.fail_commits.load(Ordering::SeqCst) {
      bail!("simulated refund commit failure");
    }
    let mut tables = self.tables.lock();
    if let Some(raced) = tables.refund_race.take() {
      if let Some(refund) = tables.refunds.get_mut(&commit.refund_id) {
        refund.status = raced;
      }
    }

    let current = tables
      .refunds
      .get(&commit.refund_id)
      .ok_or_else(|| anyhow!("refund {} vanished during commit", commit.refund_id))?;
    if current.status != commit.expected_status {
      return Ok(None);
    }
    if let Some(order_id) = commit.mark_order_refunded {
      if !tables.orders.contains_key(&order_id) {
        bail!("order {} vanished during refund commit", order_id);
      }
    }

    // All checks passed; apply every write under the same lock.
    let updated = {
      let refund = tables
        .refunds
        .get_mut(&commit.refund_id)
        .ok_or_else(|| anyhow!("refund {} vanished during commit", commit.refund_id))?;
      refund.status = commit.new_status;
      refund.admin_notes = commit.admin_notes;
      refund.processed_by = Some(commit.processed_by);
      refund.updated_at = commit.updated_at;
      if commit.completed_at.is_some() {
        refund.completed_at = commit.completed_at;
      }
      if commit.gateway_refund_id.is_some() {
        refund.gateway_refund_id = commit.gateway_refund_id;
      }
      refund.clone()
    };
    if let Some(order) = commit.mark_order_refunded.and_then(|id| tables.orders.get_mut(&id)) {
      order.payment_status = PaymentStatus::Refunded;
      order.updated_at = commit.updated_at;
    }
    if let Some(transaction) = commit.transaction {
      tables.transactions.push(transaction);
    }
    Ok(Some(updated))
  }

  async fn append_history(&self, entry: &StatusHistoryEntry) -> StoreResult<()> {
    if self.fail_history.load(Ordering::SeqCst) {
      bail!("simulated history write failure");
    }
    self.tables.lock().history.push(entry.clone());
    Ok(())
  }

  async fn history(&self, subject: HistorySubject, subject_id: Uuid) -> StoreResult<Vec<StatusHistoryEntry>> {
    Ok(
      self
        .tables
        .lock()
        .history
        .iter()
        .filter(|e| e.subject == subject && e.subject_id == subject_id)
        .cloned()
        .collect(),
    )
  }

  async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
    if self.fail_notifications.load(Ordering::SeqCst) {
      bail!("simulated notification write failure");
    }
    self.tables.lock().notifications.push(notification.clone());
    Ok(())
  }

  async fn notifications_for_refund(&self, refund_id: Uuid) -> StoreResult<Vec<Notification>> {
    Ok(
      self
        .tables
        .lock()
        .notifications
        .iter()
        .filter(|n| n.refund_id == refund_id)
        .cloned()
        .collect(),
    )
  }

  async fn payment_transactions_for_order(&self, order_id: Uuid) -> StoreResult<Vec<PaymentTransaction>> {
    Ok(
      self
        .tables
        .lock()
        .transactions
        .iter()
        .filter(|t| t.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn find_admin(&self, user_id: Uuid) -> StoreResult<Option<AdminAccount>> {
    Ok(self.tables.lock().admins.get(&user_id).cloned())
  }
}
