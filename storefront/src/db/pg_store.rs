// storefront/src/db/pg_store.rs

//! `LifecycleStore` over PostgreSQL.
//!
//! Queries are runtime-checked. Every row is decoded into a `*Row` struct and
//! converted into the typed record at this boundary, so a bad label in the
//! database surfaces as an internal error here instead of leaking into the
//! controllers.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lustre::model::{
  AdminAccount, HistorySubject, Notification, Order, OrderStatus, PaymentTransaction, Refund, StatusHistoryEntry,
};
use lustre::{LifecycleStore, RefundCommit, StoreResult};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use tracing::{debug, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, order_number, user_id, total_amount, currency, status, payment_status, \
   payment_method, gateway_order_id, gateway_payment_id, created_at, updated_at";

const REFUND_COLUMNS: &str = "id, order_id, user_id, amount, payment_method, gateway_payment_id, reason, status, \
   admin_notes, processed_by, gateway_refund_id, created_at, updated_at, completed_at";

fn parse_label<T>(column: &str, raw: &str) -> anyhow::Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  // Plain anyhow error: a bad stored label is a data problem, not a caller mistake.
  raw
    .parse::<T>()
    .map_err(|e| anyhow!("column '{}' holds an unreadable value: {}", column, e))
}

// --- Row shapes ---

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  order_number: String,
  user_id: Uuid,
  total_amount: Decimal,
  currency: String,
  status: String,
  payment_status: String,
  payment_method: String,
  gateway_order_id: Option<String>,
  gateway_payment_id: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = anyhow::Error;

  fn try_from(row: OrderRow) -> anyhow::Result<Self> {
    Ok(Order {
      status: parse_label("orders.status", &row.status)?,
      payment_status: parse_label("orders.payment_status", &row.payment_status)?,
      id: row.id,
      order_number: row.order_number,
      user_id: row.user_id,
      total_amount: row.total_amount,
      currency: row.currency,
      payment_method: row.payment_method,
      gateway_order_id: row.gateway_order_id,
      gateway_payment_id: row.gateway_payment_id,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct RefundRow {
  id: Uuid,
  order_id: Uuid,
  user_id: Uuid,
  amount: Decimal,
  payment_method: String,
  gateway_payment_id: Option<String>,
  reason: String,
  status: String,
  admin_notes: Option<String>,
  processed_by: Option<Uuid>,
  gateway_refund_id: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RefundRow> for Refund {
  type Error = anyhow::Error;

  fn try_from(row: RefundRow) -> anyhow::Result<Self> {
    Ok(Refund {
      status: parse_label("refunds.status", &row.status)?,
      id: row.id,
      order_id: row.order_id,
      user_id: row.user_id,
      amount: row.amount,
      payment_method: row.payment_method,
      gateway_payment_id: row.gateway_payment_id,
      reason: row.reason,
      admin_notes: row.admin_notes,
      processed_by: row.processed_by,
      gateway_refund_id: row.gateway_refund_id,
      created_at: row.created_at,
      updated_at: row.updated_at,
      completed_at: row.completed_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
  id: Uuid,
  subject_id: Uuid,
  previous_status: String,
  new_status: String,
  notes: Option<String>,
  changed_by: Option<Uuid>,
  created_at: DateTime<Utc>,
}

impl HistoryRow {
  fn into_entry(self, subject: HistorySubject) -> StatusHistoryEntry {
    StatusHistoryEntry {
      id: self.id,
      subject,
      subject_id: self.subject_id,
      previous_status: self.previous_status,
      new_status: self.new_status,
      note: self.notes,
      actor_id: self.changed_by,
      created_at: self.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
  id: Uuid,
  refund_id: Uuid,
  user_id: Uuid,
  notification_type: String,
  delivery_status: String,
  content: String,
  created_at: DateTime<Utc>,
  sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
  type Error = anyhow::Error;

  fn try_from(row: NotificationRow) -> anyhow::Result<Self> {
    Ok(Notification {
      channel: parse_label("refund_notifications.notification_type", &row.notification_type)?,
      delivery_status: parse_label("refund_notifications.delivery_status", &row.delivery_status)?,
      id: row.id,
      refund_id: row.refund_id,
      user_id: row.user_id,
      content: row.content,
      created_at: row.created_at,
      sent_at: row.sent_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
  id: Uuid,
  order_id: Uuid,
  refund_id: Option<Uuid>,
  transaction_type: String,
  amount: Decimal,
  currency: String,
  gateway_reference: String,
  status: String,
  gateway_response: serde_json::Value,
  created_at: DateTime<Utc>,
}

impl From<TransactionRow> for PaymentTransaction {
  fn from(row: TransactionRow) -> Self {
    PaymentTransaction {
      id: row.id,
      order_id: row.order_id,
      refund_id: row.refund_id,
      kind: row.transaction_type,
      amount: row.amount,
      currency: row.currency,
      gateway_reference: row.gateway_reference,
      status: row.status,
      gateway_response: row.gateway_response,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct AdminRow {
  user_id: Uuid,
  email: String,
  role: String,
  is_active: bool,
}

impl TryFrom<AdminRow> for AdminAccount {
  type Error = anyhow::Error;

  fn try_from(row: AdminRow) -> anyhow::Result<Self> {
    Ok(AdminAccount {
      role: parse_label("admin_users.role", &row.role)?,
      user_id: row.user_id,
      email: row.email,
      is_active: row.is_active,
    })
  }
}

// --- Store ---

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  fn history_table(subject: HistorySubject) -> (&'static str, &'static str) {
    match subject {
      HistorySubject::Order => ("order_timeline", "order_id"),
      HistorySubject::Refund => ("refund_status_history", "refund_id"),
    }
  }
}

#[async_trait]
impl LifecycleStore for PgStore {
  #[instrument(name = "PgStore::insert_order", skip_all, fields(order_id = %order.id), err)]
  async fn insert_order(&self, order: &Order) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO orders (id, order_number, user_id, total_amount, currency, status, payment_status, \
       payment_method, gateway_order_id, gateway_payment_id, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(&order.currency)
    .bind(order.status.as_str())
    .bind(order.payment_status.as_str())
    .bind(&order.payment_method)
    .bind(&order.gateway_order_id)
    .bind(&order.gateway_payment_id)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await
    .context("inserting order")?;
    Ok(())
  }

  async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .with_context(|| format!("fetching order {}", order_id))?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "PgStore::update_order_status", skip(self), err)]
  async fn update_order_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    new_status: OrderStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(expected.as_str())
    .bind(new_status.as_str())
    .bind(updated_at)
    .fetch_optional(&self.pool)
    .await
    .with_context(|| format!("updating status of order {}", order_id))?;
    if row.is_none() {
      debug!("Order status compare-and-set matched no row.");
    }
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "PgStore::insert_refund", skip_all, fields(refund_id = %refund.id), err)]
  async fn insert_refund(&self, refund: &Refund) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO refunds (id, order_id, user_id, amount, payment_method, gateway_payment_id, reason, status, \
       admin_notes, processed_by, gateway_refund_id, created_at, updated_at, completed_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(refund.id)
    .bind(refund.order_id)
    .bind(refund.user_id)
    .bind(refund.amount)
    .bind(&refund.payment_method)
    .bind(&refund.gateway_payment_id)
    .bind(&refund.reason)
    .bind(refund.status.as_str())
    .bind(&refund.admin_notes)
    .bind(refund.processed_by)
    .bind(&refund.gateway_refund_id)
    .bind(refund.created_at)
    .bind(refund.updated_at)
    .bind(refund.completed_at)
    .execute(&self.pool)
    .await
    .context("inserting refund")?;
    Ok(())
  }

  async fn find_refund(&self, refund_id: Uuid) -> StoreResult<Option<Refund>> {
    let row: Option<RefundRow> = sqlx::query_as(&format!("SELECT {} FROM refunds WHERE id = $1", REFUND_COLUMNS))
      .bind(refund_id)
      .fetch_optional(&self.pool)
      .await
      .with_context(|| format!("fetching refund {}", refund_id))?;
    row.map(Refund::try_from).transpose()
  }

  #[instrument(
    name = "PgStore::commit_refund_transition",
    skip_all,
    fields(refund_id = %commit.refund_id, from = %commit.expected_status, to = %commit.new_status),
    err
  )]
  async fn commit_refund_transition(&self, commit: RefundCommit) -> StoreResult<Option<Refund>> {
    let mut tx = self.pool.begin().await.context("opening refund transaction")?;

    let row: Option<RefundRow> = sqlx::query_as(&format!(
      "UPDATE refunds SET status = $3, admin_notes = $4, processed_by = $5, updated_at = $6, \
       completed_at = COALESCE($7, completed_at), gateway_refund_id = COALESCE($8, gateway_refund_id) \
       WHERE id = $1 AND status = $2 RETURNING {}",
      REFUND_COLUMNS
    ))
    .bind(commit.refund_id)
    .bind(commit.expected_status.as_str())
    .bind(commit.new_status.as_str())
    .bind(&commit.admin_notes)
    .bind(commit.processed_by)
    .bind(commit.updated_at)
    .bind(commit.completed_at)
    .bind(&commit.gateway_refund_id)
    .fetch_optional(&mut *tx)
    .await
    .context("updating refund")?;

    let Some(row) = row else {
      debug!("Refund status compare-and-set matched no row; rolling back.");
      tx.rollback().await.context("rolling back refund transaction")?;
      return Ok(None);
    };
    let updated = Refund::try_from(row)?;

    if let Some(order_id) = commit.mark_order_refunded {
      let result = sqlx::query("UPDATE orders SET payment_status = 'refunded', updated_at = $2 WHERE id = $1")
        .bind(order_id)
        .bind(commit.updated_at)
        .execute(&mut *tx)
        .await
        .context("marking order refunded")?;
      if result.rows_affected() != 1 {
        // Dropping `tx` rolls the refund update back.
        return Err(anyhow!("order {} vanished during refund commit", order_id));
      }
    }

    if let Some(txn) = &commit.transaction {
      sqlx::query(
        "INSERT INTO payment_transactions (id, order_id, refund_id, transaction_type, amount, currency, \
         gateway_reference, status, gateway_response, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
      )
      .bind(txn.id)
      .bind(txn.order_id)
      .bind(txn.refund_id)
      .bind(&txn.kind)
      .bind(txn.amount)
      .bind(&txn.currency)
      .bind(&txn.gateway_reference)
      .bind(&txn.status)
      .bind(&txn.gateway_response)
      .bind(txn.created_at)
      .execute(&mut *tx)
      .await
      .context("inserting payment transaction")?;
    }

    tx.commit().await.context("committing refund transaction")?;
    Ok(Some(updated))
  }

  async fn append_history(&self, entry: &StatusHistoryEntry) -> StoreResult<()> {
    let (table, fk) = Self::history_table(entry.subject);
    sqlx::query(&format!(
      "INSERT INTO {} (id, {}, previous_status, new_status, notes, changed_by, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
      table, fk
    ))
    .bind(entry.id)
    .bind(entry.subject_id)
    .bind(&entry.previous_status)
    .bind(&entry.new_status)
    .bind(&entry.note)
    .bind(entry.actor_id)
    .bind(entry.created_at)
    .execute(&self.pool)
    .await
    .with_context(|| format!("appending {} history for {}", entry.subject, entry.subject_id))?;
    Ok(())
  }

  async fn history(&self, subject: HistorySubject, subject_id: Uuid) -> StoreResult<Vec<StatusHistoryEntry>> {
    let (table, fk) = Self::history_table(subject);
    let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
      "SELECT id, {fk} AS subject_id, previous_status, new_status, notes, changed_by, created_at \
       FROM {table} WHERE {fk} = $1 ORDER BY created_at ASC, id ASC"
    ))
    .bind(subject_id)
    .fetch_all(&self.pool)
    .await
    .with_context(|| format!("listing {} history for {}", subject, subject_id))?;
    Ok(rows.into_iter().map(|r| r.into_entry(subject)).collect())
  }

  async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO refund_notifications (id, refund_id, user_id, notification_type, delivery_status, content, \
       created_at, sent_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(notification.id)
    .bind(notification.refund_id)
    .bind(notification.user_id)
    .bind(notification.channel.as_str())
    .bind(notification.delivery_status.as_str())
    .bind(&notification.content)
    .bind(notification.created_at)
    .bind(notification.sent_at)
    .execute(&self.pool)
    .await
    .context("inserting refund notification")?;
    Ok(())
  }

  async fn notifications_for_refund(&self, refund_id: Uuid) -> StoreResult<Vec<Notification>> {
    let rows: Vec<NotificationRow> = sqlx::query_as(
      "SELECT id, refund_id, user_id, notification_type, delivery_status, content, created_at, sent_at \
       FROM refund_notifications WHERE refund_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(refund_id)
    .fetch_all(&self.pool)
    .await
    .with_context(|| format!("listing notifications for refund {}", refund_id))?;
    rows.into_iter().map(Notification::try_from).collect()
  }

  async fn payment_transactions_for_order(&self, order_id: Uuid) -> StoreResult<Vec<PaymentTransaction>> {
    let rows: Vec<TransactionRow> = sqlx::query_as(
      "SELECT id, order_id, refund_id, transaction_type, amount, currency, gateway_reference, status, \
       gateway_response, created_at FROM payment_transactions WHERE order_id = $1 ORDER BY created_at ASC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .with_context(|| format!("listing payment transactions for order {}", order_id))?;
    Ok(rows.into_iter().map(PaymentTransaction::from).collect())
  }

  async fn find_admin(&self, user_id: Uuid) -> StoreResult<Option<AdminAccount>> {
    let row: Option<AdminRow> =
      sqlx::query_as("SELECT user_id, email, role, is_active FROM admin_users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetching admin account {}", user_id))?;
    row.map(AdminAccount::try_from).transpose()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use lustre::model::{OrderStatus, RefundStatus};

  fn order_row(status: &str) -> OrderRow {
    let now = Utc::now();
    OrderRow {
      id: Uuid::new_v4(),
      order_number: "LUS-1001".to_string(),
      user_id: Uuid::new_v4(),
      total_amount: Decimal::from(1_200),
      currency: "INR".to_string(),
      status: status.to_string(),
      payment_status: "completed".to_string(),
      payment_method: "razorpay".to_string(),
      gateway_order_id: None,
      gateway_payment_id: Some("pay_1".to_string()),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn decodes_order_rows_into_typed_records() {
    let order = Order::try_from(order_row("shipped")).unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
  }

  #[test]
  fn unreadable_labels_are_internal_not_validation() {
    let err = Order::try_from(order_row("teleported")).unwrap_err();
    let lifecycle = lustre::LifecycleError::from(err);
    assert!(matches!(lifecycle, lustre::LifecycleError::Internal { .. }));
  }

  #[test]
  fn history_rows_keep_their_subject() {
    let row = HistoryRow {
      id: Uuid::new_v4(),
      subject_id: Uuid::new_v4(),
      previous_status: RefundStatus::Pending.to_string(),
      new_status: RefundStatus::Processing.to_string(),
      notes: None,
      changed_by: None,
      created_at: Utc::now(),
    };
    let entry = row.into_entry(HistorySubject::Refund);
    assert_eq!(entry.subject, HistorySubject::Refund);
    assert_eq!(entry.new_status, "processing");
  }
}
