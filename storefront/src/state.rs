// storefront/src/state.rs

use crate::config::{AppConfig, GatewayMode, StoreBackend};
use crate::db;
use crate::errors::{AppError, Result};
use crate::services::{HttpIdentityProvider, RazorpayGateway};
use lustre::{
  IdentityProvider, InMemoryStore, LifecycleDeps, LifecycleStore, MockGateway, OrderStatusController,
  PaymentGateway, RefundStateController,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn LifecycleStore>,
  pub identity: Arc<dyn IdentityProvider>,
  pub refunds: Arc<RefundStateController>,
  pub orders: Arc<OrderStatusController>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(
    config: Arc<AppConfig>,
    store: Arc<dyn LifecycleStore>,
    gateway: Arc<dyn PaymentGateway>,
    identity: Arc<dyn IdentityProvider>,
  ) -> Self {
    let deps = LifecycleDeps::new(store.clone(), gateway, config.notification_channel);
    Self {
      refunds: Arc::new(RefundStateController::new(deps.clone())),
      orders: Arc::new(OrderStatusController::new(deps)),
      store,
      identity,
      config,
    }
  }

  /// Wires the configured store, gateway and identity provider.
  pub async fn from_config(config: Arc<AppConfig>) -> Result<Self> {
    let store: Arc<dyn LifecycleStore> = match config.store_backend {
      StoreBackend::Postgres => {
        let database_url = config
          .database_url
          .as_deref()
          .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres store".to_string()))?;
        let pool = db::connect(database_url).await?;
        if config.run_migrations {
          db::run_migrations(&pool).await?;
        }
        Arc::new(db::PgStore::new(pool))
      }
      StoreBackend::Memory => {
        warn!("Using the in-memory store; nothing survives a restart.");
        Arc::new(InMemoryStore::new())
      }
    };

    let gateway: Arc<dyn PaymentGateway> = match (config.gateway_mode, config.razorpay.clone()) {
      (GatewayMode::Live, Some(razorpay)) => Arc::new(
        RazorpayGateway::new(razorpay, config.gateway_method_label.clone(), config.gateway_timeout)
          .map_err(|e| AppError::Config(e.to_string()))?,
      ),
      (GatewayMode::Live, None) => {
        return Err(AppError::Config("live gateway mode needs Razorpay credentials".to_string()));
      }
      (GatewayMode::Mock, _) => {
        warn!("Using the mock payment gateway; no money will move.");
        Arc::new(MockGateway::generating(&config.gateway_method_label))
      }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(
      HttpIdentityProvider::new(&config.auth_base_url, config.auth_api_key.clone(), config.auth_timeout)
        .map_err(|e| AppError::Config(e.to_string()))?,
    );

    info!(
      store = ?config.store_backend,
      gateway = ?config.gateway_mode,
      "Lifecycle collaborators wired."
    );
    Ok(Self::new(config, store, gateway, identity))
  }
}
