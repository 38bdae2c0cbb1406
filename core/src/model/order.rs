// lustre/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
  /// Fulfilment status of an order. Any status may follow any other except itself.
  pub enum OrderStatus ("order status") {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
  }
}

text_enum! {
  pub enum PaymentStatus ("payment status") {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    /// Only set in the same commit that completes a child refund.
    Refunded => "refunded",
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Uuid,
  pub total_amount: Decimal,
  pub currency: String,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_method: String,
  pub gateway_order_id: Option<String>,
  pub gateway_payment_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// A freshly checked-out order: pending fulfilment, payment captured.
  pub fn new(
    order_number: impl Into<String>,
    user_id: Uuid,
    total_amount: Decimal,
    currency: impl Into<String>,
    payment_method: impl Into<String>,
    gateway_payment_id: Option<String>,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      order_number: order_number.into(),
      user_id,
      total_amount,
      currency: currency.into(),
      status: OrderStatus::Pending,
      payment_status: PaymentStatus::Completed,
      payment_method: payment_method.into(),
      gateway_order_id: None,
      gateway_payment_id,
      created_at: now,
      updated_at: now,
    }
  }
}
