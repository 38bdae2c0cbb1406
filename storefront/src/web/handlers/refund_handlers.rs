// storefront/src/web/handlers/refund_handlers.rs

use actix_web::{web, HttpResponse};
use lustre::model::RefundStatus;
use lustre::{ProcessRefund, RefundRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AdminIdentity, CustomerIdentity};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRefundPayload {
  pub refund_id: Uuid,
  pub status: String,
  pub admin_notes: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RequestRefundPayload {
  pub order_id: Uuid,
  pub amount: Decimal,
  pub reason: String,
}

// --- Handlers ---

#[instrument(
  name = "handler::process_refund",
  skip(app_state, payload, admin),
  fields(admin_id = %admin.user_id(), refund_id = %payload.refund_id, status = %payload.status)
)]
pub async fn process_refund_handler(
  app_state: web::Data<AppState>,
  admin: AdminIdentity,
  payload: web::Json<ProcessRefundPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let target_status: RefundStatus = payload.status.parse()?;

  let outcome = app_state
    .refunds
    .process(ProcessRefund {
      refund_id: payload.refund_id,
      actor_id: admin.user_id(),
      target_status,
      admin_notes: payload.admin_notes,
    })
    .await?;

  if outcome.side_effects.all_succeeded() {
    info!(previous = %outcome.previous_status, "Refund processed.");
  } else {
    warn!(failures = ?outcome.side_effects.failures(), "Refund processed with incomplete side effects.");
  }

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Refund status updated to {}", outcome.refund.status),
    "refund": outcome.refund,
    "paymentGatewayResponse": outcome.gateway_response,
    "sideEffectFailures": outcome.side_effects,
  })))
}

#[instrument(name = "handler::get_refund", skip(app_state, path, _admin), fields(refund_id = %path.as_ref()))]
pub async fn get_refund_handler(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let detail = app_state.refunds.refund_detail(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "refund": detail.refund,
    "history": detail.history,
    "notifications": detail.notifications,
  })))
}

#[instrument(
  name = "handler::request_refund",
  skip(app_state, payload, customer),
  fields(user_id = %customer.0.user_id, order_id = %payload.order_id)
)]
pub async fn request_refund_handler(
  app_state: web::Data<AppState>,
  customer: CustomerIdentity,
  payload: web::Json<RequestRefundPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let refund = app_state
    .refunds
    .request_refund(RefundRequest {
      order_id: payload.order_id,
      user_id: customer.0.user_id,
      amount: payload.amount,
      reason: payload.reason,
    })
    .await?;

  info!(refund_id = %refund.id, "Refund request accepted.");
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "refund": refund,
  })))
}
