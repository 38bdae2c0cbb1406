// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use lustre::model::NotificationChannel;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which `PaymentGateway` the server wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
  /// Razorpay-style HTTP refunds.
  Live,
  /// In-process `MockGateway`, for local development.
  Mock,
}

impl FromStr for GatewayMode {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "live" | "razorpay" => Ok(GatewayMode::Live),
      "mock" => Ok(GatewayMode::Mock),
      other => Err(AppError::Config(format!("Invalid GATEWAY_MODE '{}': expected live or mock", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected postgres or memory",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
  pub base_url: String,
  pub key_id: String,
  pub key_secret: String,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub run_migrations: bool,

  pub auth_base_url: String,
  pub auth_api_key: String,

  pub gateway_mode: GatewayMode,
  /// Present whenever `gateway_mode` is `Live`.
  pub razorpay: Option<RazorpayConfig>,
  pub gateway_timeout: Duration,
  /// Payment-method label on orders that the configured gateway settles.
  pub gateway_method_label: String,

  /// Client timeout for bearer-token lookups against the auth provider.
  pub auth_timeout: Duration,
  pub notification_channel: NotificationChannel,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("run_migrations", &self.run_migrations)
      .field("auth_base_url", &self.auth_base_url)
      .field("gateway_mode", &self.gateway_mode)
      .field("gateway_timeout", &self.gateway_timeout)
      .field("gateway_method_label", &self.gateway_method_label)
      .field("auth_timeout", &self.auth_timeout)
      .field("notification_channel", &self.notification_channel)
      .finish_non_exhaustive()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let parse_bool = |var_name: &str, default: bool| -> Result<bool> {
      match get_env(var_name) {
        Ok(raw) => raw
          .trim()
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = get_env("STORE_BACKEND")
      .unwrap_or_else(|_| "postgres".to_string())
      .parse::<StoreBackend>()?;
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StoreBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations = parse_bool("RUN_MIGRATIONS", false)?;

    let auth_base_url = get_env("AUTH_BASE_URL")?.trim_end_matches('/').to_string();
    let auth_api_key = get_env("AUTH_API_KEY")?;

    let gateway_mode = get_env("GATEWAY_MODE")
      .unwrap_or_else(|_| "live".to_string())
      .parse::<GatewayMode>()?;
    let razorpay = match gateway_mode {
      GatewayMode::Live => Some(RazorpayConfig {
        base_url: get_env("RAZORPAY_BASE_URL")
          .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string())
          .trim_end_matches('/')
          .to_string(),
        key_id: get_env("RAZORPAY_KEY_ID")?,
        key_secret: get_env("RAZORPAY_KEY_SECRET")?,
      }),
      GatewayMode::Mock => None,
    };
    let gateway_timeout_secs = get_env("GATEWAY_TIMEOUT_SECS")
      .unwrap_or_else(|_| "30".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid GATEWAY_TIMEOUT_SECS: {}", e)))?;
    let gateway_method_label = get_env("GATEWAY_METHOD_LABEL").unwrap_or_else(|_| "razorpay".to_string());

    let auth_timeout_secs = get_env("AUTH_TIMEOUT_SECS")
      .unwrap_or_else(|_| "10".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid AUTH_TIMEOUT_SECS: {}", e)))?;
    let notification_channel = get_env("NOTIFICATION_CHANNEL")
      .unwrap_or_else(|_| "in_app".to_string())
      .parse::<NotificationChannel>()
      .map_err(|e| AppError::Config(format!("Invalid NOTIFICATION_CHANNEL: {}", e)))?;

    let config = Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      run_migrations,
      auth_base_url,
      auth_api_key,
      gateway_mode,
      razorpay,
      gateway_timeout: Duration::from_secs(gateway_timeout_secs),
      gateway_method_label,
      auth_timeout: Duration::from_secs(auth_timeout_secs),
      notification_channel,
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
