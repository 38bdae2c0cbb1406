// tests/refund_workflow_tests.rs
mod common;

use common::*;
use lustre::lifecycle::refund_workflow::{STEP_EMIT_NOTIFICATION, STEP_RECORD_HISTORY};
use lustre::model::{HistorySubject, OrderStatus, PaymentStatus, Refund, RefundStatus};
use lustre::{LifecycleError, LifecycleStore, MockGateway, ProcessRefund, RefundRequest};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn process(h: &Harness, refund_id: Uuid, target: RefundStatus, notes: &str) -> ProcessRefund {
  ProcessRefund {
    refund_id,
    actor_id: h.admin_id,
    target_status: target,
    admin_notes: Some(notes.to_string()),
  }
}

#[tokio::test]
async fn pending_to_processing_records_history_and_notifies() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(1_200).await;
  let refund = h.seed_refund(&order, 500).await;

  let outcome = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Looking into it"))
    .await
    .unwrap();

  assert_eq!(outcome.refund.status, RefundStatus::Processing);
  assert_eq!(outcome.previous_status, RefundStatus::Pending);
  assert!(outcome.side_effects.all_succeeded());
  assert!(outcome.gateway_response.is_none());
  assert!(h.gateway.calls().is_empty());

  let history = h.store.history(HistorySubject::Refund, refund.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].previous_status, "pending");
  assert_eq!(history[0].new_status, "processing");
  assert_eq!(history[0].actor_id, Some(h.admin_id));

  let notifications = h.store.notifications_for_refund(refund.id).await.unwrap();
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0].user_id, h.customer_id);
  assert!(notifications[0].content.contains("3-5 business days"));
}

#[tokio::test]
async fn completing_refund_calls_gateway_and_marks_order_refunded() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(1_200).await;
  let refund = h.seed_refund(&order, 500).await;

  h.refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap();
  let outcome = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Completed, "Refunded to card"))
    .await
    .unwrap();

  let completed = &outcome.refund;
  assert_eq!(completed.status, RefundStatus::Completed);
  assert!(completed.completed_at.is_some());
  assert_eq!(completed.processed_by, Some(h.admin_id));
  assert_eq!(completed.gateway_refund_id.as_deref(), Some("pay_123"));
  assert_eq!(outcome.gateway_response.as_ref().unwrap()["id"], "pay_123");

  let order_after = h.store.find_order(order.id).await.unwrap().unwrap();
  assert_eq!(order_after.payment_status, PaymentStatus::Refunded);
  assert_eq!(order_after.status, OrderStatus::Pending);

  let transactions = h.store.payment_transactions_for_order(order.id).await.unwrap();
  assert_eq!(transactions.len(), 1);
  assert_eq!(transactions[0].gateway_reference, "pay_123");
  assert_eq!(transactions[0].refund_id, Some(refund.id));
  assert_eq!(transactions[0].gateway_response["status"], "captured");

  let calls = h.gateway.calls();
  assert_eq!(calls.len(), 1);
  assert_eq!(calls[0].payment_id, "pay_original");
  assert_eq!(calls[0].amount_minor, 50_000);
  assert_eq!(calls[0].idempotency_key, refund.idempotency_key());
  assert_eq!(calls[0].notes.get("refund_id"), Some(&refund.id.to_string()));
  assert_eq!(calls[0].notes.get("reason").map(String::as_str), Some("Stone came loose"));

  let notifications = h.store.notifications_for_refund(refund.id).await.unwrap();
  assert_eq!(notifications.len(), 2);
  assert!(notifications[1].content.contains("INR 500.00"));
}

#[tokio::test]
async fn gateway_failure_leaves_refund_untouched() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(1_200).await;
  let refund = h.seed_refund(&order, 500).await;
  h.refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap();
  let before = h.store.find_refund(refund.id).await.unwrap().unwrap();
  let history_before = h.store.history_len();

  h.gateway.fail_next_calls("connection reset by peer");
  let err = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Completed, "Refund now"))
    .await
    .unwrap_err();

  assert!(matches!(err, LifecycleError::PaymentGateway { .. }), "got {err:?}");
  let after = h.store.find_refund(refund.id).await.unwrap().unwrap();
  assert_eq!(after.status, RefundStatus::Processing);
  assert_eq!(after.completed_at, before.completed_at);
  assert_eq!(after.processed_by, before.processed_by);
  assert_eq!(h.store.history_len(), history_before);
  assert_eq!(
    h.store.find_order(order.id).await.unwrap().unwrap().payment_status,
    PaymentStatus::Completed
  );
  assert!(h.store.payment_transactions_for_order(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn same_status_is_rejected_without_history() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "first"))
    .await
    .unwrap();

  let err = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "again"))
    .await
    .unwrap_err();

  assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
  assert_eq!(h.store.history(HistorySubject::Refund, refund.id).await.unwrap().len(), 1);
  assert_eq!(h.store.notification_len(), 1);
}

#[tokio::test]
async fn terminal_refunds_accept_no_further_transition() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.refunds
    .process(process(&h, refund.id, RefundStatus::Rejected, "Outside return window"))
    .await
    .unwrap();

  for target in [RefundStatus::Processing, RefundStatus::Completed] {
    let err = h.refunds.process(process(&h, refund.id, target, "retry")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
  }
  assert!(h.gateway.calls().is_empty());
}

#[tokio::test]
async fn pending_is_not_an_admin_target() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;

  let err = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Pending, ""))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::Validation(_)));
}

#[tokio::test]
async fn unknown_refund_is_not_found() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let err = h
    .refunds
    .process(process(&h, Uuid::new_v4(), RefundStatus::Processing, ""))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::NotFound { entity: "refund", .. }));
}

#[tokio::test]
async fn rejection_notifies_customer_to_contact_support() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;

  let outcome = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Rejected, "Item shows wear"))
    .await
    .unwrap();

  assert_eq!(outcome.refund.status, RefundStatus::Rejected);
  assert!(outcome.refund.completed_at.is_none());
  assert_eq!(outcome.refund.admin_notes.as_deref(), Some("Item shows wear"));
  let notifications = h.store.notifications_for_refund(refund.id).await.unwrap();
  assert_eq!(notifications.len(), 1);
  assert!(notifications[0].content.contains("contact support"));
  assert_eq!(
    h.store.find_order(order.id).await.unwrap().unwrap().payment_status,
    PaymentStatus::Completed
  );
}

#[tokio::test]
async fn completing_cash_on_delivery_refund_skips_gateway() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_cod_order(700).await;
  let refund = h.seed_refund(&order, 700).await;

  let outcome = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Completed, "Bank transfer sent"))
    .await
    .unwrap();

  assert!(h.gateway.calls().is_empty());
  assert!(outcome.gateway_response.is_none());
  assert!(outcome.refund.completed_at.is_some());
  assert_eq!(
    h.store.find_order(order.id).await.unwrap().unwrap().payment_status,
    PaymentStatus::Refunded
  );
  assert!(h.store.payment_transactions_for_order(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn side_effect_failures_are_reported_not_raised() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.store.fail_history_writes(true);
  h.store.fail_notification_writes(true);

  let outcome = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap();

  assert_eq!(outcome.refund.status, RefundStatus::Processing);
  assert!(outcome.side_effects.failed(STEP_RECORD_HISTORY));
  assert!(outcome.side_effects.failed(STEP_EMIT_NOTIFICATION));
  assert_eq!(outcome.side_effects.failures().len(), 2);
  assert_eq!(
    h.store.find_refund(refund.id).await.unwrap().unwrap().status,
    RefundStatus::Processing
  );
}

#[tokio::test]
async fn commit_failure_is_internal_and_skips_side_effects() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.store.fail_refund_commits(true);

  let err = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap_err();

  assert!(matches!(err, LifecycleError::Internal { .. }));
  assert_eq!(h.store.history_len(), 0);
  assert_eq!(h.store.notification_len(), 0);
}

#[tokio::test]
async fn concurrent_status_change_surfaces_as_conflict() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.store.race_next_refund_commit(RefundStatus::Rejected);

  let err = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap_err();

  assert!(matches!(err, LifecycleError::Conflict { entity: "refund", .. }), "got {err:?}");
  let stored = h.store.find_refund(refund.id).await.unwrap().unwrap();
  assert_eq!(stored.status, RefundStatus::Rejected);
  assert_eq!(h.store.history_len(), 0);
  assert_eq!(h.store.notification_len(), 0);
}

#[tokio::test]
async fn retried_completion_reuses_the_gateway_refund() {
  let h = Harness::new(MockGateway::generating(GATEWAY_LABEL));
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap();

  // The first completion reaches the gateway but its commit fails.
  h.store.fail_refund_commits(true);
  let err = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Completed, "Done"))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::Internal { .. }));
  h.store.fail_refund_commits(false);

  let outcome = h
    .refunds
    .process(process(&h, refund.id, RefundStatus::Completed, "Done"))
    .await
    .unwrap();

  let calls = h.gateway.calls();
  assert_eq!(calls.len(), 2);
  assert_eq!(calls[0].idempotency_key, calls[1].idempotency_key);
  assert_eq!(h.gateway.refunds_issued(), 1);
  assert!(outcome
    .refund
    .gateway_refund_id
    .as_deref()
    .is_some_and(|id| id.starts_with("rfnd_mock_")));
}

#[tokio::test]
async fn refund_request_validates_ownership_and_amount() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(1_000).await;

  let too_much = h
    .refunds
    .request_refund(RefundRequest {
      order_id: order.id,
      user_id: h.customer_id,
      amount: Decimal::from(1_001),
      reason: "Changed my mind".to_string(),
    })
    .await
    .unwrap_err();
  assert!(matches!(too_much, LifecycleError::Validation(_)));

  let stranger = h
    .refunds
    .request_refund(RefundRequest {
      order_id: order.id,
      user_id: Uuid::new_v4(),
      amount: Decimal::from(100),
      reason: "Not mine".to_string(),
    })
    .await
    .unwrap_err();
  assert!(matches!(stranger, LifecycleError::Forbidden(_)));

  let blank_reason = h
    .refunds
    .request_refund(RefundRequest {
      order_id: order.id,
      user_id: h.customer_id,
      amount: Decimal::from(100),
      reason: "   ".to_string(),
    })
    .await
    .unwrap_err();
  assert!(matches!(blank_reason, LifecycleError::Validation(_)));

  let refund = h
    .refunds
    .request_refund(RefundRequest {
      order_id: order.id,
      user_id: h.customer_id,
      amount: Decimal::from_str("249.50").unwrap(),
      reason: " Clasp broke ".to_string(),
    })
    .await
    .unwrap();
  assert_eq!(refund.status, RefundStatus::Pending);
  assert_eq!(refund.reason, "Clasp broke");
  assert_eq!(refund.payment_method, GATEWAY_LABEL);
  assert_eq!(refund.gateway_payment_id.as_deref(), Some("pay_original"));
  assert!(h.store.find_refund(refund.id).await.unwrap().is_some());
}

#[tokio::test]
async fn sub_paise_amounts_are_rejected() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(1_000).await;

  let err = h
    .refunds
    .request_refund(RefundRequest {
      order_id: order.id,
      user_id: h.customer_id,
      amount: Decimal::from_str("0.004").unwrap(),
      reason: "Tiny scratch".to_string(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::Validation(_)));

  // Trailing zeros are not extra precision.
  let refund = h
    .refunds
    .request_refund(RefundRequest {
      order_id: order.id,
      user_id: h.customer_id,
      amount: Decimal::from_str("10.500").unwrap(),
      reason: "Tiny scratch".to_string(),
    })
    .await
    .unwrap();
  assert_eq!(refund.amount, Decimal::from_str("10.5").unwrap());

  // A row that slipped in with a sub-paise amount never reaches the gateway.
  let legacy = Refund::pending(
    order.id,
    order.user_id,
    Decimal::from_str("0.004").unwrap(),
    order.payment_method.clone(),
    order.gateway_payment_id.clone(),
    "Tiny scratch",
  );
  h.store.insert_refund(&legacy).await.unwrap();

  let err = h
    .refunds
    .process(process(&h, legacy.id, RefundStatus::Completed, "pay it"))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::Validation(_)));
  assert!(h.gateway.calls().is_empty());

  let stored = h.store.find_refund(legacy.id).await.unwrap().unwrap();
  assert_eq!(stored.status, RefundStatus::Pending);
  let order_after = h.store.find_order(order.id).await.unwrap().unwrap();
  assert_ne!(order_after.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn refund_detail_collects_history_and_notifications() {
  let h = Harness::with_gateway_returning("pay_123", "captured");
  let order = h.seed_order(900).await;
  let refund = h.seed_refund(&order, 300).await;
  h.refunds
    .process(process(&h, refund.id, RefundStatus::Processing, "Approved"))
    .await
    .unwrap();
  h.refunds
    .process(process(&h, refund.id, RefundStatus::Completed, "Done"))
    .await
    .unwrap();

  let detail = h.refunds.refund_detail(refund.id).await.unwrap();
  assert_eq!(detail.refund.status, RefundStatus::Completed);
  let transitions: Vec<_> = detail
    .history
    .iter()
    .map(|e| (e.previous_status.as_str(), e.new_status.as_str()))
    .collect();
  assert_eq!(transitions, vec![("pending", "processing"), ("processing", "completed")]);
  assert_eq!(detail.notifications.len(), 2);
}
