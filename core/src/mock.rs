// lustre/src/mock.rs

//! Scripted collaborators for tests and local development.

use crate::error::{LifecycleError, LifecycleResult};
use crate::gateway::{GatewayError, GatewayRefund, GatewayRefundRequest, PaymentGateway};
use crate::identity::{Identity, IdentityProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum MockGatewayBehavior {
  /// Fixed gateway id and status for every call.
  Succeed { gateway_id: String, status: String },
  /// A fresh `rfnd_mock_*` id per idempotency key.
  Generate,
  Fail(String),
}

/// A payment gateway that never leaves the process.
///
/// Repeated calls with the same idempotency key get the first response back,
/// mirroring how a real gateway deduplicates retried refunds.
pub struct MockGateway {
  method_label: String,
  behavior: Mutex<MockGatewayBehavior>,
  calls: Mutex<Vec<GatewayRefundRequest>>,
  issued: Mutex<HashMap<String, GatewayRefund>>,
}

impl MockGateway {
  fn with_behavior(method_label: &str, behavior: MockGatewayBehavior) -> Self {
    Self {
      method_label: method_label.to_string(),
      behavior: Mutex::new(behavior),
      calls: Mutex::new(Vec::new()),
      issued: Mutex::new(HashMap::new()),
    }
  }

  pub fn succeeding(method_label: &str, gateway_id: &str, status: &str) -> Self {
    Self::with_behavior(
      method_label,
      MockGatewayBehavior::Succeed {
        gateway_id: gateway_id.to_string(),
        status: status.to_string(),
      },
    )
  }

  pub fn generating(method_label: &str) -> Self {
    Self::with_behavior(method_label, MockGatewayBehavior::Generate)
  }

  pub fn failing(method_label: &str, message: &str) -> Self {
    Self::with_behavior(method_label, MockGatewayBehavior::Fail(message.to_string()))
  }

  pub fn fail_next_calls(&self, message: &str) {
    *self.behavior.lock() = MockGatewayBehavior::Fail(message.to_string());
  }

  pub fn succeed_next_calls(&self, gateway_id: &str, status: &str) {
    *self.behavior.lock() = MockGatewayBehavior::Succeed {
      gateway_id: gateway_id.to_string(),
      status: status.to_string(),
    };
  }

  pub fn calls(&self) -> Vec<GatewayRefundRequest> {
    self.calls.lock().clone()
  }

  /// Distinct refunds actually issued (one per idempotency key).
  pub fn refunds_issued(&self) -> usize {
    self.issued.lock().len()
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn method_label(&self) -> &str {
    &self.method_label
  }

  async fn refund(&self, request: GatewayRefundRequest) -> Result<GatewayRefund, GatewayError> {
    self.calls.lock().push(request.clone());

    if let Some(previous) = self.issued.lock().get(&request.idempotency_key) {
      info!(idempotency_key = %request.idempotency_key, "Mock gateway replaying earlier refund.");
      return Ok(previous.clone());
    }

    let behavior = self.behavior.lock().clone();
    let (gateway_id, status) = match behavior {
      MockGatewayBehavior::Succeed { gateway_id, status } => (gateway_id, status),
      MockGatewayBehavior::Generate => (format!("rfnd_mock_{}", Uuid::new_v4().simple()), "processed".to_string()),
      MockGatewayBehavior::Fail(message) => return Err(GatewayError::Transport(message)),
    };

    let refund = GatewayRefund {
      raw: serde_json::json!({
        "id": gateway_id,
        "entity": "refund",
        "amount": request.amount_minor,
        "currency": request.currency,
        "payment_id": request.payment_id,
        "notes": request.notes,
        "status": status,
      }),
      gateway_id,
      status,
    };
    self.issued.lock().insert(request.idempotency_key.clone(), refund.clone());
    info!(gateway_id = %refund.gateway_id, "Mock gateway refund issued.");
    Ok(refund)
  }
}

/// Token → identity table.
#[derive(Default)]
pub struct StaticIdentityProvider {
  tokens: Mutex<HashMap<String, Identity>>,
}

impl StaticIdentityProvider {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_token(self, token: &str, user_id: Uuid) -> Self {
    self.tokens.lock().insert(
      token.to_string(),
      Identity {
        user_id,
        email: None,
      },
    );
    self
  }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
  async fn resolve(&self, token: &str) -> LifecycleResult<Identity> {
    self
      .tokens
      .lock()
      .get(token)
      .cloned()
      .ok_or_else(|| LifecycleError::Unauthorized("invalid or expired token".to_string()))
  }
}
