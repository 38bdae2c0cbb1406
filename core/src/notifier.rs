// lustre/src/notifier.rs

//! Writes the user-facing notification that accompanies a refund transition.

use crate::error::LifecycleResult;
use crate::model::{DeliveryStatus, Notification, NotificationChannel, Refund, RefundStatus};
use crate::store::LifecycleStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationEmitter {
  store: Arc<dyn LifecycleStore>,
  channel: NotificationChannel,
}

impl NotificationEmitter {
  pub fn new(store: Arc<dyn LifecycleStore>, channel: NotificationChannel) -> Self {
    Self { store, channel }
  }

  /// Queues one pending notification for the refund's owner.
  #[instrument(
    name = "notifier::emit_refund_update",
    skip(self, refund, currency),
    fields(refund_id = %refund.id, user_id = %refund.user_id, %target),
    err(Display)
  )]
  pub async fn emit_refund_update(
    &self,
    refund: &Refund,
    currency: &str,
    target: RefundStatus,
  ) -> LifecycleResult<Notification> {
    let notification = Notification {
      id: Uuid::new_v4(),
      refund_id: refund.id,
      user_id: refund.user_id,
      channel: self.channel,
      delivery_status: DeliveryStatus::Pending,
      content: refund_update_content(refund, currency, target),
      created_at: Utc::now(),
      sent_at: None,
    };
    self.store.insert_notification(&notification).await?;
    info!(notification_id = %notification.id, channel = %self.channel, "Refund notification queued.");
    Ok(notification)
  }
}

pub fn refund_update_content(refund: &Refund, currency: &str, target: RefundStatus) -> String {
  match target {
    RefundStatus::Completed => format!(
      "Your refund of {} {:.2} has been processed and will be credited to your account in 3-5 business days.",
      currency, refund.amount
    ),
    RefundStatus::Processing => {
      "Your refund request is being processed. You can expect an update within 3-5 business days.".to_string()
    }
    _ => "Your refund request has been reviewed. Please contact support for more details.".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn refund() -> Refund {
    Refund::pending(Uuid::new_v4(), Uuid::new_v4(), Decimal::from(500), "razorpay", None, "wrong size")
  }

  #[test]
  fn completed_message_carries_amount() {
    let content = refund_update_content(&refund(), "INR", RefundStatus::Completed);
    assert!(content.contains("INR 500.00"));
    assert!(content.contains("3-5 business days"));
  }

  #[test]
  fn rejected_message_points_to_support() {
    let content = refund_update_content(&refund(), "INR", RefundStatus::Rejected);
    assert!(content.contains("contact support"));
  }
}
