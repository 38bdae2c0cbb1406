// lustre/src/gateway.rs

//! Payment gateway port. The gateway is a black box that either refunds the
//! payment and returns its own refund id, or fails.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayRefundRequest {
  pub payment_id: String,
  pub amount_minor: i64,
  pub currency: String,
  pub idempotency_key: String,
  pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRefund {
  pub gateway_id: String,
  pub status: String,
  /// The decoded response body, kept verbatim for the audit row.
  pub raw: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
  #[error("gateway request failed: {0}")]
  Transport(String),

  #[error("gateway rejected refund (HTTP {status}): {message}")]
  Rejected { status: u16, message: String },

  #[error("gateway response could not be decoded: {0}")]
  Decode(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Payment-method label this gateway settles (compared case-insensitively
  /// with `Refund::payment_method`).
  fn method_label(&self) -> &str;

  /// One attempt, no retry. Callers pass an idempotency key so a retried
  /// request at the HTTP layer cannot issue a second refund.
  async fn refund(&self, request: GatewayRefundRequest) -> Result<GatewayRefund, GatewayError>;
}
