// storefront/src/services/identity.rs

//! Resolves bearer tokens against the hosted auth service's user endpoint.

use anyhow::Context;
use async_trait::async_trait;
use lustre::{Identity, IdentityProvider, LifecycleError, LifecycleResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct AuthUser {
  id: Uuid,
  email: Option<String>,
}

pub struct HttpIdentityProvider {
  user_url: String,
  api_key: String,
  client: reqwest::Client,
}

impl HttpIdentityProvider {
  pub fn new(auth_base_url: &str, api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
    Ok(Self {
      user_url: format!("{}/auth/v1/user", auth_base_url.trim_end_matches('/')),
      api_key: api_key.into(),
      client: reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create identity HTTP client")?,
    })
  }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
  #[instrument(name = "HttpIdentityProvider::resolve", skip_all, err(Display))]
  async fn resolve(&self, token: &str) -> LifecycleResult<Identity> {
    let response = self
      .client
      .get(&self.user_url)
      .header("apikey", &self.api_key)
      .bearer_auth(token)
      .send()
      .await
      .context("calling auth service")?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
      return Err(LifecycleError::Unauthorized("invalid or expired token".to_string()));
    }
    if !status.is_success() {
      warn!(status = status.as_u16(), "Auth service answered with an unexpected status.");
      return Err(anyhow::anyhow!("auth service returned HTTP {}", status.as_u16()).into());
    }

    let user: AuthUser = response.json().await.context("decoding auth service user")?;
    Ok(Identity {
      user_id: user.id,
      email: user.email,
    })
  }
}
