mod common;

use common::wait_for;
use payment::gateway::{FailNTimes, MockPaymentProcessor};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn happy_path_confirms_the_order_and_completes_payment() {
    let saga = common::wire(Arc::new(MockPaymentProcessor::new())).await;
    let (order_id, saga_id) = common::submit_order(&saga.order_pool, "user-123", 99.99).await;

    let status = wait_for(Duration::from_secs(5), || {
        let pool = saga.order_pool.clone();
        async move { common::order_status(&pool, order_id).await.filter(|s| s != "PROCESSING") }
    })
    .await;
    assert_eq!(status, "CONFIRMED");

    let transaction_id: Option<uuid::Uuid> =
        sqlx::query_scalar("SELECT transaction_id FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&saga.order_pool)
            .await
            .unwrap();
    assert!(transaction_id.is_some());

    let (risk_score, approved): (i32, bool) = sqlx::query_as(
        "SELECT risk_score, approved FROM risk_assessments WHERE saga_id = $1",
    )
    .bind(saga_id)
    .fetch_one(&saga.risk_pool)
    .await
    .unwrap();
    assert!(approved);
    assert_eq!(risk_score, 0);

    let payment_status: String =
        sqlx::query_scalar("SELECT status FROM payment_transactions WHERE saga_id = $1")
            .bind(saga_id)
            .fetch_one(&saga.payment_pool)
            .await
            .unwrap();
    assert_eq!(payment_status, "COMPLETED");

    let notification_count: i64 = wait_for(Duration::from_secs(5), || {
        let pool = saga.notification_pool.clone();
        async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sent_notifications WHERE order_id = $1 AND category = 'SUCCESS'",
            )
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
            (count > 0).then_some(count)
        }
    })
    .await;
    assert_eq!(notification_count, 1);
}

#[tokio::test]
async fn a_blacklisted_user_is_declined_and_the_order_is_cancelled_without_a_payment_attempt() {
    let saga = common::wire(Arc::new(MockPaymentProcessor::new())).await;
    let (order_id, saga_id) = common::submit_order(&saga.order_pool, "blocked-user-456", 149.99).await;

    let status = wait_for(Duration::from_secs(5), || {
        let pool = saga.order_pool.clone();
        async move { common::order_status(&pool, order_id).await.filter(|s| s != "PROCESSING") }
    })
    .await;
    assert_eq!(status, "CANCELLED");

    let reason: Option<String> =
        sqlx::query_scalar("SELECT cancellation_reason FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&saga.order_pool)
            .await
            .unwrap();
    assert_eq!(reason.as_deref(), Some("Risk check declined"));

    let (approved, risk_score, rolled_back): (bool, i32, bool) = wait_for(Duration::from_secs(5), || {
        let pool = saga.risk_pool.clone();
        async move {
            sqlx::query_as::<_, (bool, i32, bool)>(
                "SELECT approved, risk_score, rolled_back FROM risk_assessments WHERE saga_id = $1",
            )
            .bind(saga_id)
            .fetch_optional(&pool)
            .await
            .unwrap()
            .filter(|(_, _, rolled_back)| *rolled_back)
        }
    })
    .await;
    assert!(!approved);
    assert_eq!(risk_score, 30);
    assert!(rolled_back);

    let payment_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payment_transactions WHERE saga_id = $1")
            .bind(saga_id)
            .fetch_one(&saga.payment_pool)
            .await
            .unwrap();
    assert_eq!(payment_count, 0, "a declined risk check must never reach the gateway");
}

#[tokio::test]
async fn an_amount_over_the_fraud_threshold_is_declined() {
    let saga = common::wire(Arc::new(MockPaymentProcessor::new())).await;
    let (order_id, saga_id) = common::submit_order(&saga.order_pool, "user-789", 15000.00).await;

    let status = wait_for(Duration::from_secs(5), || {
        let pool = saga.order_pool.clone();
        async move { common::order_status(&pool, order_id).await.filter(|s| s != "PROCESSING") }
    })
    .await;
    assert_eq!(status, "CANCELLED");

    let risk_score: i32 = sqlx::query_scalar("SELECT risk_score FROM risk_assessments WHERE saga_id = $1")
        .bind(saga_id)
        .fetch_one(&saga.risk_pool)
        .await
        .unwrap();
    assert!(risk_score >= 40);

    let payment_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payment_transactions WHERE saga_id = $1")
            .bind(saga_id)
            .fetch_one(&saga.payment_pool)
            .await
            .unwrap();
    assert_eq!(payment_count, 0);
}

#[tokio::test]
async fn exhausting_gateway_retries_fails_the_payment_and_cancels_the_order() {
    let saga = common::wire(Arc::new(FailNTimes::new(3))).await;
    let (order_id, saga_id) = common::submit_order(&saga.order_pool, "user-retry", 50.0).await;

    let status = wait_for(Duration::from_secs(15), || {
        let pool = saga.order_pool.clone();
        async move { common::order_status(&pool, order_id).await.filter(|s| s != "PROCESSING") }
    })
    .await;
    assert_eq!(status, "CANCELLED");

    let reason: Option<String> =
        sqlx::query_scalar("SELECT cancellation_reason FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&saga.order_pool)
            .await
            .unwrap();
    assert!(reason.unwrap_or_default().starts_with("Payment failed:"));

    let payment_status: String =
        sqlx::query_scalar("SELECT status FROM payment_transactions WHERE saga_id = $1")
            .bind(saga_id)
            .fetch_one(&saga.payment_pool)
            .await
            .unwrap();
    assert_eq!(payment_status, "FAILED");

    let rolled_back: bool = wait_for(Duration::from_secs(5), || {
        let pool = saga.risk_pool.clone();
        async move {
            sqlx::query_scalar::<_, bool>("SELECT rolled_back FROM risk_assessments WHERE saga_id = $1")
                .bind(saga_id)
                .fetch_one(&pool)
                .await
                .ok()
                .filter(|rolled_back| *rolled_back)
        }
    })
    .await;
    assert!(rolled_back);

    let failure_notifications: i64 = wait_for(Duration::from_secs(5), || {
        let pool = saga.notification_pool.clone();
        async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sent_notifications WHERE order_id = $1 AND category = 'FAILURE'",
            )
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
            (count > 0).then_some(count)
        }
    })
    .await;
    assert_eq!(failure_notifications, 1);
}

#[tokio::test]
async fn a_synthetic_cancellation_after_completion_refunds_the_payment() {
    let saga = common::wire(Arc::new(MockPaymentProcessor::new())).await;
    let (order_id, saga_id) = common::submit_order(&saga.order_pool, "user-refund", 75.0).await;

    wait_for(Duration::from_secs(5), || {
        let pool = saga.payment_pool.clone();
        async move {
            sqlx::query_scalar::<_, String>("SELECT status FROM payment_transactions WHERE saga_id = $1")
                .bind(saga_id)
                .fetch_optional(&pool)
                .await
                .unwrap()
                .filter(|status| status == "COMPLETED")
        }
    })
    .await;

    let envelope = saga_contracts::EventEnvelope::new(
        saga_contracts::EventType::OrderCancelled,
        saga_id,
        "order",
        saga_contracts::payloads::OrderCancelled {
            order_id,
            reason: "manual test cancellation".to_string(),
            cancelled_at: chrono::Utc::now(),
        },
    );
    saga.bus
        .publish_keyed(
            saga_contracts::EventType::OrderCancelled.topic().as_str(),
            &saga_id.to_string(),
            serde_json::to_vec(&envelope).unwrap(),
        )
        .await
        .unwrap();

    let (status, refund_id): (String, Option<String>) = wait_for(Duration::from_secs(5), || {
        let pool = saga.payment_pool.clone();
        async move {
            sqlx::query_as::<_, (String, Option<String>)>(
                "SELECT status, refund_id FROM payment_transactions WHERE saga_id = $1",
            )
            .bind(saga_id)
            .fetch_one(&pool)
            .await
            .ok()
            .filter(|(status, _)| status == "REFUNDED")
        }
    })
    .await;
    assert_eq!(status, "REFUNDED");
    assert!(refund_id.is_some());

    let refund_notifications: i64 = wait_for(Duration::from_secs(5), || {
        let pool = saga.notification_pool.clone();
        async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sent_notifications WHERE order_id = $1 AND category = 'REFUND'",
            )
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
            (count > 0).then_some(count)
        }
    })
    .await;
    assert_eq!(refund_notifications, 1);
}

#[tokio::test]
async fn redelivering_payment_processed_against_an_already_confirmed_order_is_a_no_op() {
    let saga = common::wire(Arc::new(MockPaymentProcessor::new())).await;
    let (order_id, saga_id) = common::submit_order(&saga.order_pool, "user-dup", 40.0).await;

    wait_for(Duration::from_secs(5), || {
        let pool = saga.order_pool.clone();
        async move { common::order_status(&pool, order_id).await.filter(|s| s == "CONFIRMED") }
    })
    .await;

    let transaction_id: uuid::Uuid =
        sqlx::query_scalar("SELECT transaction_id FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&saga.order_pool)
            .await
            .unwrap();

    let envelope = saga_contracts::EventEnvelope::new(
        saga_contracts::EventType::PaymentProcessed,
        saga_id,
        "payment",
        saga_contracts::payloads::PaymentProcessed {
            order_id,
            transaction_id,
            amount: 40.0,
            currency: "USD".to_string(),
            processed_at: chrono::Utc::now(),
            gateway_transaction_id: Some("replayed".to_string()),
            auth_code: Some("replayed".to_string()),
        },
    );
    saga.bus
        .publish_keyed(
            saga_contracts::EventType::PaymentProcessed.topic().as_str(),
            &saga_id.to_string(),
            serde_json::to_vec(&envelope).unwrap(),
        )
        .await
        .unwrap();

    // The replay carries a fresh event_id, so it is a distinct delivery as
    // far as idempotency is concerned — what must stay fixed is the order's
    // terminal state and the notification count, not the raw handler call.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let status = common::order_status(&saga.order_pool, order_id).await.unwrap();
    assert_eq!(status, "CONFIRMED");

    let notification_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sent_notifications WHERE order_id = $1 AND category = 'SUCCESS'",
    )
    .bind(order_id)
    .fetch_one(&saga.notification_pool)
    .await
    .unwrap();
    assert_eq!(notification_count, 1, "dedup must suppress the second SUCCESS dispatch");

    let dead_lettered: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM failed_events")
        .fetch_one(&saga.order_pool)
        .await
        .unwrap();
    assert_eq!(
        dead_lettered, 0,
        "the replay must be handled as a no-op, not retried to exhaustion and dead-lettered"
    );
}
