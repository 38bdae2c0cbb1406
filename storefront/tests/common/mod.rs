// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use lustre::model::{AdminAccount, AdminRole, Order, Refund};
use lustre::{InMemoryStore, LifecycleStore, MockGateway, StaticIdentityProvider};
use lustre_storefront::{AppConfig, AppState};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "Bearer admin-token";
pub const CUSTOMER_TOKEN: &str = "Bearer customer-token";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Mounts the production routes over `$state` and returns the test service.
#[macro_export]
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state))
        .configure(lustre_storefront::configure_app_routes),
    )
    .await
  };
}

pub struct TestServer {
  pub state: AppState,
  pub store: Arc<InMemoryStore>,
  pub gateway: Arc<MockGateway>,
  pub admin_id: Uuid,
  pub customer_id: Uuid,
}

fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "STORE_BACKEND" => Some("memory".to_string()),
    "GATEWAY_MODE" => Some("mock".to_string()),
    "AUTH_BASE_URL" => Some("http://auth.invalid".to_string()),
    "AUTH_API_KEY" => Some("test-anon-key".to_string()),
    _ => None,
  })
  .expect("test configuration is valid")
}

impl TestServer {
  pub fn new(gateway: MockGateway) -> Self {
    setup_tracing();
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(gateway);
    let admin_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();
    store.add_admin(AdminAccount {
      user_id: admin_id,
      email: "ops@lustre.test".to_string(),
      role: AdminRole::Admin,
      is_active: true,
    });
    let identity = StaticIdentityProvider::new()
      .with_token("admin-token", admin_id)
      .with_token("customer-token", customer_id);

    let state = AppState::new(Arc::new(test_config()), store.clone(), gateway.clone(), Arc::new(identity));
    Self {
      state,
      store,
      gateway,
      admin_id,
      customer_id,
    }
  }

  pub fn with_gateway_returning(gateway_id: &str, status: &str) -> Self {
    Self::new(MockGateway::succeeding("razorpay", gateway_id, status))
  }

  pub async fn seed_order(&self, total: i64) -> Order {
    let order = Order::new(
      format!("LUS-{}", &Uuid::new_v4().simple().to_string()[..8]),
      self.customer_id,
      Decimal::from(total),
      "INR",
      "razorpay",
      Some("pay_original".to_string()),
    );
    self.store.insert_order(&order).await.unwrap();
    order
  }

  pub async fn seed_refund(&self, order: &Order, amount: i64) -> Refund {
    let refund = Refund::pending(
      order.id,
      order.user_id,
      Decimal::from(amount),
      order.payment_method.clone(),
      order.gateway_payment_id.clone(),
      "Stone came loose",
    );
    self.store.insert_refund(&refund).await.unwrap();
    refund
  }
}
