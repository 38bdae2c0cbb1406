// storefront/src/services/razorpay.rs

//! Razorpay-style refund client. One `POST /payments/{id}/refund` per call,
//! no retry; the idempotency key makes a caller-level retry safe.

use crate::config::RazorpayConfig;
use anyhow::Context;
use async_trait::async_trait;
use lustre::{GatewayError, GatewayRefund, GatewayRefundRequest, PaymentGateway};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, instrument};

#[derive(Debug, Serialize)]
struct RefundBody<'a> {
  amount: i64,
  speed: &'static str,
  receipt: &'a str,
  notes: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
  id: String,
  status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
  description: Option<String>,
  code: Option<String>,
}

pub struct RazorpayGateway {
  config: RazorpayConfig,
  method_label: String,
  client: reqwest::Client,
}

impl RazorpayGateway {
  pub fn new(config: RazorpayConfig, method_label: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
    Ok(Self {
      config,
      method_label: method_label.into(),
      client: reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create gateway HTTP client")?,
    })
  }

  fn refund_url(&self, payment_id: &str) -> String {
    format!("{}/payments/{}/refund", self.config.base_url, payment_id)
  }
}

/// Pulls the gateway's own explanation out of an error body, falling back to the raw text.
fn rejection_message(body: &str) -> String {
  match serde_json::from_str::<ErrorEnvelope>(body) {
    Ok(envelope) => match (envelope.error.code, envelope.error.description) {
      (Some(code), Some(description)) => format!("{}: {}", code, description),
      (None, Some(description)) => description,
      (Some(code), None) => code,
      (None, None) => body.to_string(),
    },
    Err(_) if body.trim().is_empty() => "empty response body".to_string(),
    Err(_) => body.to_string(),
  }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
  fn method_label(&self) -> &str {
    &self.method_label
  }

  #[instrument(
    name = "RazorpayGateway::refund",
    skip_all,
    fields(payment_id = %request.payment_id, amount_minor = request.amount_minor),
    err(Display)
  )]
  async fn refund(&self, request: GatewayRefundRequest) -> Result<GatewayRefund, GatewayError> {
    let body = RefundBody {
      amount: request.amount_minor,
      speed: "normal",
      receipt: &request.idempotency_key,
      notes: &request.notes,
    };

    let response = self
      .client
      .post(self.refund_url(&request.payment_id))
      .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
      .header("Idempotency-Key", &request.idempotency_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        error!(error = %e, "Gateway refund request did not complete.");
        GatewayError::Transport(e.to_string())
      })?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| GatewayError::Transport(format!("reading response body: {}", e)))?;

    if !status.is_success() {
      return Err(GatewayError::Rejected {
        status: status.as_u16(),
        message: rejection_message(&text),
      });
    }

    let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))?;
    let parsed: RefundResponse =
      serde_json::from_value(raw.clone()).map_err(|e| GatewayError::Decode(e.to_string()))?;
    info!(gateway_id = %parsed.id, status = %parsed.status, "Gateway refund created.");

    Ok(GatewayRefund {
      gateway_id: parsed.id,
      status: parsed.status,
      raw,
    })
  }
}
