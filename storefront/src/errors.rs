// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use lustre::LifecycleError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  /// Request body or path that never reached a controller.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Lifecycle(LifecycleError::from(err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Lifecycle(err) => match err {
        LifecycleError::Validation(_) | LifecycleError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
        LifecycleError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        LifecycleError::Forbidden(_) => StatusCode::FORBIDDEN,
        LifecycleError::NotFound { .. } => StatusCode::NOT_FOUND,
        LifecycleError::Conflict { .. } => StatusCode::CONFLICT,
        LifecycleError::PaymentGateway { .. }
        | LifecycleError::HandlerMissing { .. }
        | LifecycleError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migration(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = ?self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    // Internals are summarised; the detail only goes to the log.
    let message = match self {
      AppError::Lifecycle(LifecycleError::Internal { .. })
      | AppError::Lifecycle(LifecycleError::HandlerMissing { .. })
      | AppError::Sqlx(_)
      | AppError::Migration(_)
      | AppError::Internal(_) => "An internal error occurred".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      other => other.to_string(),
    };
    HttpResponse::build(status).json(json!({ "error": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
