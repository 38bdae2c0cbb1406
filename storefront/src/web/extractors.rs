// storefront/src/web/extractors.rs

//! Request extractors resolving the bearer token into a caller identity.

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use lustre::{authenticate, authorize_admin, AdminActor, Identity};
use uuid::Uuid;

fn request_parts(req: &HttpRequest) -> Result<(web::Data<AppState>, Option<String>), AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .cloned()
    .ok_or_else(|| AppError::Internal("application state is not configured".to_string()))?;
  let authorization = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string);
  Ok((state, authorization))
}

/// A caller with an active `admin_users` row.
#[derive(Debug)]
pub struct AdminIdentity(pub AdminActor);

impl AdminIdentity {
  pub fn user_id(&self) -> Uuid {
    self.0.user_id()
  }
}

impl FromRequest for AdminIdentity {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let parts = request_parts(req);
    Box::pin(async move {
      let (state, authorization) = parts?;
      let actor = authorize_admin(state.identity.as_ref(), state.store.as_ref(), authorization.as_deref()).await?;
      Ok(AdminIdentity(actor))
    })
  }
}

/// Any signed-in customer.
#[derive(Debug)]
pub struct CustomerIdentity(pub Identity);

impl FromRequest for CustomerIdentity {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let parts = request_parts(req);
    Box::pin(async move {
      let (state, authorization) = parts?;
      let identity = authenticate(state.identity.as_ref(), authorization.as_deref()).await?;
      Ok(CustomerIdentity(identity))
    })
  }
}
