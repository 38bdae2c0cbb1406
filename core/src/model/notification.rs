// lustre/src/model/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
  pub enum NotificationChannel ("notification channel") {
    InApp => "in_app",
    Email => "email",
    Sms => "sms",
  }
}

text_enum! {
  pub enum DeliveryStatus ("delivery status") {
    Pending => "pending",
    Sent => "sent",
  }
}

/// A refund status message queued for the refund's owner.
/// Content never changes; delivery status is advanced by the delivery system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: Uuid,
  pub refund_id: Uuid,
  pub user_id: Uuid,
  pub channel: NotificationChannel,
  pub delivery_status: DeliveryStatus,
  pub content: String,
  pub created_at: DateTime<Utc>,
  pub sent_at: Option<DateTime<Utc>>,
}
