// tests/order_workflow_tests.rs
mod common;

use common::*;
use lustre::lifecycle::order_workflow::STEP_RECORD_TIMELINE;
use lustre::model::{OrderStatus, PaymentStatus};
use lustre::{LifecycleError, LifecycleStore, OrderTransition};
use uuid::Uuid;

fn transition(order_id: Uuid, target: OrderStatus, note: Option<&str>, actor: Uuid) -> OrderTransition {
  OrderTransition {
    order_id,
    target_status: target,
    note: note.map(str::to_string),
    actor_id: Some(actor),
  }
}

#[tokio::test]
async fn transition_updates_order_and_timeline() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(2_500).await;

  let outcome = h
    .orders
    .transition(transition(order.id, OrderStatus::Shipped, Some("Dispatched via BlueDart"), h.admin_id))
    .await
    .unwrap();

  assert_eq!(outcome.previous_status, OrderStatus::Pending);
  assert_eq!(outcome.order.status, OrderStatus::Shipped);
  assert!(outcome.order.updated_at >= order.updated_at);
  assert!(outcome.side_effects.all_succeeded());
  assert_eq!(outcome.order.payment_status, PaymentStatus::Completed);

  let timeline = h.orders.timeline(order.id).await.unwrap();
  assert_eq!(timeline.len(), 1);
  assert_eq!(timeline[0].previous_status, "pending");
  assert_eq!(timeline[0].new_status, "shipped");
  assert_eq!(timeline[0].note.as_deref(), Some("Dispatched via BlueDart"));
  assert_eq!(timeline[0].actor_id, Some(h.admin_id));
}

#[tokio::test]
async fn missing_note_gets_default_timeline_text() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(400).await;

  h.orders
    .transition(transition(order.id, OrderStatus::Confirmed, None, h.admin_id))
    .await
    .unwrap();
  h.orders
    .transition(transition(order.id, OrderStatus::Processing, Some("   "), h.admin_id))
    .await
    .unwrap();

  let timeline = h.orders.timeline(order.id).await.unwrap();
  assert_eq!(timeline[0].note.as_deref(), Some("Status updated to confirmed"));
  assert_eq!(timeline[1].note.as_deref(), Some("Status updated to processing"));
}

#[tokio::test]
async fn same_status_is_rejected() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(400).await;

  let err = h
    .orders
    .transition(transition(order.id, OrderStatus::Pending, None, h.admin_id))
    .await
    .unwrap_err();

  assert!(matches!(err, LifecycleError::InvalidTransition { entity: "order", .. }));
  assert!(h.orders.timeline(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_order_is_not_found() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let err = h
    .orders
    .transition(transition(Uuid::new_v4(), OrderStatus::Shipped, None, h.admin_id))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::NotFound { entity: "order", .. }));
}

#[tokio::test]
async fn any_status_may_follow_any_other() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(400).await;

  for target in [OrderStatus::Delivered, OrderStatus::Pending, OrderStatus::Cancelled, OrderStatus::Shipped] {
    let outcome = h
      .orders
      .transition(transition(order.id, target, None, h.admin_id))
      .await
      .unwrap();
    assert_eq!(outcome.order.status, target);
  }
  assert_eq!(h.orders.timeline(order.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn timeline_failure_is_reported_after_status_persists() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(400).await;
  h.store.fail_history_writes(true);

  let outcome = h
    .orders
    .transition(transition(order.id, OrderStatus::Cancelled, Some("Customer called"), h.admin_id))
    .await
    .unwrap();

  assert!(outcome.side_effects.failed(STEP_RECORD_TIMELINE));
  assert_eq!(outcome.side_effects.failures().len(), 1);
  let stored = h.store.find_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Cancelled);
  assert_eq!(h.store.history_len(), 0);
}

#[tokio::test]
async fn concurrent_order_update_surfaces_as_conflict() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(2_500).await;
  h.store.race_next_order_update(OrderStatus::Cancelled);

  let err = h
    .orders
    .transition(transition(order.id, OrderStatus::Shipped, None, h.admin_id))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::Conflict { entity: "order", .. }));

  let stored = h.store.find_order(order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Cancelled);
  assert!(h.orders.timeline(order.id).await.unwrap().is_empty());
}
