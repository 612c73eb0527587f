use crate::db;
use crate::error::OrderError;
use crate::models::{Order, OrderStatus};
use saga_contracts::payloads::{
    OrderCancelled, OrderItem, PaymentInitiated, RiskCheckCompleted, RiskCheckFailed,
};
use saga_contracts::runtime::outbox;
use saga_contracts::{EventEnvelope, EventType};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Creates the order and kicks off a new saga by enqueuing
/// `PAYMENT_INITIATED` on `payment-saga` in the same transaction as the
/// insert.
pub async fn initiate_payment(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    amount: f64,
    currency: &str,
    payment_method: &str,
    items: Vec<OrderItem>,
) -> Result<Order, OrderError> {
    let order_id = Uuid::new_v4();
    let saga_id = Uuid::new_v4();

    let order = db::insert(tx, order_id, user_id, saga_id, amount, currency, payment_method).await?;

    let envelope = EventEnvelope::new(
        EventType::PaymentInitiated,
        saga_id,
        "order",
        PaymentInitiated {
            order_id,
            user_id: user_id.to_string(),
            amount,
            currency: currency.to_string(),
            payment_method: payment_method.to_string(),
            items,
        },
    );

    outbox::enqueue(
        tx,
        envelope.event_id,
        EventType::PaymentInitiated.topic().as_str(),
        saga_id,
        &serde_json::to_value(&envelope).map_err(|e| OrderError::Validation(e.to_string()))?,
    )
    .await?;

    db::set_status(tx, order_id, OrderStatus::Processing).await?;

    Ok(order)
}

/// Risk approved: advance toward confirmation once payment succeeds.
/// Risk declined: cancel immediately, before payment ever starts.
pub async fn handle_risk_check_completed(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    payload: RiskCheckCompleted,
) -> Result<(), OrderError> {
    let Some(order) = db::find_by_saga_id(tx, saga_id).await? else {
        return Ok(());
    };

    if payload.approved {
        // Payment continues processing asynchronously; no status change
        // here, PAYMENT_PROCESSED/PAYMENT_FAILED carry the next transition.
        return Ok(());
    }

    cancel(tx, &order, "Risk check declined".to_string()).await
}

pub async fn handle_risk_check_failed(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    payload: RiskCheckFailed,
) -> Result<(), OrderError> {
    let Some(order) = db::find_by_saga_id(tx, saga_id).await? else {
        return Ok(());
    };

    cancel(tx, &order, format!("Risk check failed: {}", payload.reason)).await
}

pub async fn handle_payment_processed(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    transaction_id: Uuid,
) -> Result<(), OrderError> {
    let Some(order) = db::find_by_saga_id(tx, saga_id).await? else {
        return Ok(());
    };

    if order.status.is_terminal() {
        return Ok(());
    }

    order.transition(OrderStatus::Confirmed)?;
    db::set_confirmed(tx, order.order_id, transaction_id).await?;
    Ok(())
}

pub async fn handle_payment_failed(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    payload: saga_contracts::payloads::PaymentFailed,
) -> Result<(), OrderError> {
    let Some(order) = db::find_by_saga_id(tx, saga_id).await? else {
        return Ok(());
    };

    cancel(tx, &order, format!("Payment failed: {}", payload.reason)).await
}

/// Shared compensation trigger: moves the order to `CANCELLED` and emits
/// `ORDER_CANCELLED` on `saga-compensation`. `order_id` rides along in the
/// payload for observability only — Risk and Payment look the event up by
/// `saga_id`, never by `order_id` alone.
pub async fn cancel(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    reason: String,
) -> Result<(), OrderError> {
    if order.status.is_terminal() {
        return Ok(());
    }

    db::set_cancelled(tx, order.order_id, &reason).await?;

    let envelope = EventEnvelope::new(
        EventType::OrderCancelled,
        order.saga_id,
        "order",
        OrderCancelled {
            order_id: order.order_id,
            reason,
            cancelled_at: chrono::Utc::now(),
        },
    );

    outbox::enqueue(
        tx,
        envelope.event_id,
        EventType::OrderCancelled.topic().as_str(),
        order.saga_id,
        &serde_json::to_value(&envelope).map_err(|e| OrderError::Validation(e.to_string()))?,
    )
    .await?;

    Ok(())
}
