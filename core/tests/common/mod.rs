// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use lustre::model::{AdminAccount, AdminRole, NotificationChannel, Order, Refund};
use lustre::{
  InMemoryStore, LifecycleDeps, LifecycleStore, MockGateway, OrderStatusController, RefundStateController,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const GATEWAY_LABEL: &str = "razorpay";

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

/// One in-memory storefront with an active admin and a customer.
pub struct Harness {
  pub store: Arc<InMemoryStore>,
  pub gateway: Arc<MockGateway>,
  pub refunds: RefundStateController,
  pub orders: OrderStatusController,
  pub admin_id: Uuid,
  pub customer_id: Uuid,
}

impl Harness {
  pub fn new(gateway: MockGateway) -> Self {
    setup_tracing();
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(gateway);
    let deps = LifecycleDeps::new(store.clone(), gateway.clone(), NotificationChannel::InApp);

    let admin_id = Uuid::new_v4();
    store.add_admin(AdminAccount {
      user_id: admin_id,
      email: "ops@lustre.test".to_string(),
      role: AdminRole::Admin,
      is_active: true,
    });

    Self {
      refunds: RefundStateController::new(deps.clone()),
      orders: OrderStatusController::new(deps),
      store,
      gateway,
      admin_id,
      customer_id: Uuid::new_v4(),
    }
  }

  pub fn with_gateway_returning(gateway_id: &str, status: &str) -> Self {
    Self::new(MockGateway::succeeding(GATEWAY_LABEL, gateway_id, status))
  }

  /// A captured online order for the harness customer.
  pub async fn seed_order(&self, total: i64) -> Order {
    let order = Order::new(
      format!("LUS-{}", &Uuid::new_v4().simple().to_string()[..8]),
      self.customer_id,
      Decimal::from(total),
      "INR",
      GATEWAY_LABEL,
      Some("pay_original".to_string()),
    );
    self.store.insert_order(&order).await.unwrap();
    order
  }

  pub async fn seed_cod_order(&self, total: i64) -> Order {
    let order = Order::new(
      "LUS-COD",
      self.customer_id,
      Decimal::from(total),
      "INR",
      "cod",
      None,
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
