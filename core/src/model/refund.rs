// lustre/src/model/refund.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
  pub enum RefundStatus ("refund status") {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Rejected => "rejected",
  }
}

impl RefundStatus {
  /// Statuses an admin may submit through `process`.
  pub const ADMIN_TARGETS: &'static [RefundStatus] =
    &[RefundStatus::Processing, RefundStatus::Completed, RefundStatus::Rejected];

  pub fn is_terminal(&self) -> bool {
    matches!(self, RefundStatus::Completed | RefundStatus::Rejected)
  }

  /// Forward-only transition table. Terminal statuses accept nothing.
  pub fn can_transition_to(&self, target: RefundStatus) -> bool {
    use RefundStatus::*;
    matches!(
      (self, target),
      (Pending, Processing) | (Pending, Completed) | (Pending, Rejected) | (Processing, Completed) | (Processing, Rejected)
    )
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub amount: Decimal,
  pub payment_method: String,
  pub gateway_payment_id: Option<String>,
  pub reason: String,
  pub status: RefundStatus,
  pub admin_notes: Option<String>,
  pub processed_by: Option<Uuid>,
  pub gateway_refund_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl Refund {
  pub fn pending(
    order_id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    payment_method: impl Into<String>,
    gateway_payment_id: Option<String>,
    reason: impl Into<String>,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      order_id,
      user_id,
      amount,
      payment_method: payment_method.into(),
      gateway_payment_id,
      reason: reason.into(),
      status: RefundStatus::Pending,
      admin_notes: None,
      processed_by: None,
      gateway_refund_id: None,
      created_at: now,
      updated_at: now,
      completed_at: None,
    }
  }

  /// The gateway payment id, when the refund was paid through `gateway_method`.
  pub fn gateway_payment_for(&self, gateway_method: &str) -> Option<&str> {
    if !self.payment_method.eq_ignore_ascii_case(gateway_method) {
      return None;
    }
    self.gateway_payment_id.as_deref().filter(|id| !id.trim().is_empty())
  }

  /// Key sent with every gateway refund call so a retried request cannot refund twice.
  pub fn idempotency_key(&self) -> String {
    format!("refund_{}", self.id.simple())
  }
}
