// lustre/src/model/transaction.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit row for money movement at the gateway, keeping the raw response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
  pub id: Uuid,
  pub order_id: Uuid,
  pub refund_id: Option<Uuid>,
  pub kind: String,
  pub amount: Decimal,
  pub currency: String,
  pub gateway_reference: String,
  pub status: String,
  pub gateway_response: serde_json::Value,
  pub created_at: DateTime<Utc>,
}
