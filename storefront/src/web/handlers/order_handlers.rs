// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use lustre::model::OrderStatus;
use lustre::{LifecycleError, LifecycleStore, OrderTransition};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminIdentity;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusPayload {
  pub order_id: Uuid,
  pub status: String,
  pub notes: Option<String>,
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, payload, admin),
  fields(admin_id = %admin.user_id(), order_id = %payload.order_id, status = %payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminIdentity,
  payload: web::Json<UpdateOrderStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let target_status: OrderStatus = payload.status.parse()?;

  let outcome = app_state
    .orders
    .transition(OrderTransition {
      order_id: payload.order_id,
      target_status,
      note: payload.notes,
      actor_id: Some(admin.user_id()),
    })
    .await?;

  if !outcome.side_effects.all_succeeded() {
    warn!(failures = ?outcome.side_effects.failures(), "Order status saved but the timeline entry was not.");
  }
  info!(previous = %outcome.previous_status, "Order status updated.");

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Order status updated to {}", outcome.order.status),
    "order": outcome.order,
    "sideEffectFailures": outcome.side_effects,
  })))
}

#[instrument(name = "handler::order_timeline", skip(app_state, path, _admin), fields(order_id = %path.as_ref()))]
pub async fn order_timeline_handler(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = app_state
    .store
    .find_order(order_id)
    .await?
    .ok_or_else(|| LifecycleError::not_found("order", order_id))?;
  let timeline = app_state.orders.timeline(order_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "order": order,
    "timeline": timeline,
  })))
}
