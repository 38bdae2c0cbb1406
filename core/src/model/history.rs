// lustre/src/model/history.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
  /// Which table an entry belongs to: `order_timeline` or `refund_status_history`.
  pub enum HistorySubject ("history subject") {
    Order => "order",
    Refund => "refund",
  }
}

/// One status transition. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
  pub id: Uuid,
  pub subject: HistorySubject,
  pub subject_id: Uuid,
  pub previous_status: String,
  pub new_status: String,
  pub note: Option<String>,
  pub actor_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
}
