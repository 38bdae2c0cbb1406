// storefront/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{order_handlers, refund_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed or incomplete JSON bodies answer 400 with the usual `{error}` shape.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(16 * 1024)
    .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(json_config()).service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Customer routes
      .route("/refunds", web::post().to(refund_handlers::request_refund_handler))
      // Admin routes; every handler takes an `AdminIdentity`
      .service(
        web::scope("/admin")
          .route("/refunds/process", web::post().to(refund_handlers::process_refund_handler))
          .route("/refunds/{refund_id}", web::get().to(refund_handlers::get_refund_handler))
          .route("/orders/status", web::post().to(order_handlers::update_order_status_handler))
          .route(
            "/orders/{order_id}/timeline",
            web::get().to(order_handlers::order_timeline_handler),
          ),
      ),
  );
}
