// lustre/src/identity.rs

//! Bearer-token identity resolution and the admin gate in front of every
//! lifecycle mutation.

use crate::error::{LifecycleError, LifecycleResult};
use crate::model::AdminAccount;
use crate::store::LifecycleStore;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub user_id: Uuid,
  pub email: Option<String>,
}

/// An identity that passed the admin check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminActor {
  pub identity: Identity,
  pub account: AdminAccount,
}

impl AdminActor {
  pub fn user_id(&self) -> Uuid {
    self.identity.user_id
  }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
  /// Resolves a raw bearer token. Unknown or expired tokens are `Unauthorized`.
  async fn resolve(&self, token: &str) -> LifecycleResult<Identity>;
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> LifecycleResult<&str> {
  let header = authorization.ok_or_else(|| LifecycleError::Unauthorized("missing authorization header".to_string()))?;
  let token = header
    .strip_prefix("Bearer ")
    .or_else(|| header.strip_prefix("bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| LifecycleError::Unauthorized("authorization header is not a bearer token".to_string()))?;
  Ok(token)
}

#[instrument(name = "identity::authenticate", skip_all, err(Display))]
pub async fn authenticate(provider: &dyn IdentityProvider, authorization: Option<&str>) -> LifecycleResult<Identity> {
  let token = bearer_token(authorization)?;
  let identity = provider.resolve(token).await?;
  debug!(user_id = %identity.user_id, "Bearer token resolved.");
  Ok(identity)
}

/// Resolves the caller and requires an active `admin_users` row for them.
#[instrument(name = "identity::authorize_admin", skip_all, err(Display))]
pub async fn authorize_admin(
  provider: &dyn IdentityProvider,
  store: &dyn LifecycleStore,
  authorization: Option<&str>,
) -> LifecycleResult<AdminActor> {
  let identity = authenticate(provider, authorization).await?;
  match store.find_admin(identity.user_id).await? {
    Some(account) if account.is_active => Ok(AdminActor { identity, account }),
    Some(_) => {
      warn!(user_id = %identity.user_id, "Inactive admin account attempted a back-office action.");
      Err(LifecycleError::Forbidden("admin account is inactive".to_string()))
    }
    None => {
      warn!(user_id = %identity.user_id, "Non-admin attempted a back-office action.");
      Err(LifecycleError::Forbidden("admin access required".to_string()))
    }
  }
}
