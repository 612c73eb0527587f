use crate::db;
use crate::error::PaymentError;
use crate::gateway::PaymentGateway;
use event_bus::consumer_retry::retry_with_backoff;
use saga_contracts::payloads::{PaymentFailed, PaymentProcessed, PaymentRefunded};
use saga_contracts::runtime::{gateway_retry_config, outbox};
use saga_contracts::{EventEnvelope, EventType};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

/// Caches the amount/currency a saga was initiated with, so the later
/// `RISK_CHECK_COMPLETED` handler — whose payload never repeats them —
/// has what it needs to place a charge.
pub async fn handle_payment_initiated(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    order_id: Uuid,
    amount: f64,
    currency: &str,
) -> Result<(), PaymentError> {
    db::upsert_context(tx, saga_id, order_id, amount, currency).await?;
    Ok(())
}

/// Not approved is a silent no-op — Risk already emitted the decline,
/// Order already cancelled. Approved kicks off a `PROCESSING` row, calls
/// the gateway (retried with its own backoff policy), and settles into
/// `COMPLETED`/`FAILED`.
pub async fn handle_risk_check_completed(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    order_id: Uuid,
    approved: bool,
    gateway: &Arc<dyn PaymentGateway>,
) -> Result<(), PaymentError> {
    if !approved {
        return Ok(());
    }

    if db::find_by_saga_id(tx, saga_id).await?.is_some() {
        return Ok(());
    }

    // PAYMENT_INITIATED and RISK_CHECK_COMPLETED arrive on separate topics
    // with no ordering guarantee between them; if the context row isn't
    // there yet, error out rather than charge against a made-up amount —
    // the handler retry policy gives the other consumer time to catch up.
    let (amount, currency) = db::find_context(tx, saga_id)
        .await?
        .ok_or(PaymentError::MissingContext(saga_id))?;
    let currency = currency.as_str();

    let transaction_id = Uuid::new_v4();
    db::insert_processing(tx, transaction_id, order_id, saga_id, amount, currency).await?;

    let charge = retry_with_backoff(
        || gateway.charge(amount, currency),
        &gateway_retry_config(),
        "payment_gateway_charge",
    )
    .await;

    let (event_id, topic, value) = match charge {
        Ok(result) => {
            db::set_completed(tx, transaction_id, &result.gateway_transaction_id, &result.auth_code).await?;
            let envelope = EventEnvelope::new(
                EventType::PaymentProcessed,
                saga_id,
                "payment",
                PaymentProcessed {
                    order_id,
                    transaction_id,
                    amount,
                    currency: currency.to_string(),
                    processed_at: chrono::Utc::now(),
                    gateway_transaction_id: Some(result.gateway_transaction_id),
                    auth_code: Some(result.auth_code),
                },
            );
            (envelope.event_id, envelope.event_type.topic().as_str(), serde_json::to_value(&envelope).unwrap())
        }
        Err(reason) => {
            db::set_failed(tx, transaction_id, &reason).await?;
            let envelope = EventEnvelope::new(
                EventType::PaymentFailed,
                saga_id,
                "payment",
                PaymentFailed { order_id, reason, error_code: "GATEWAY_DECLINED".to_string() },
            );
            (envelope.event_id, envelope.event_type.topic().as_str(), serde_json::to_value(&envelope).unwrap())
        }
    };

    outbox::enqueue(tx, event_id, topic, saga_id, &value).await?;

    Ok(())
}

/// Refund only from `COMPLETED`. `PROCESSING`/`FAILED` never moved money
/// to completion, so there is nothing to undo; `REFUNDED` is already
/// terminal. Refund gateway failure is logged for manual intervention and
/// deliberately does not retry inline or roll the transaction back out of
/// `COMPLETED` — see the design notes on this divergence.
pub async fn handle_compensation(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    reason: &str,
    gateway: &Arc<dyn PaymentGateway>,
) -> Result<(), PaymentError> {
    let Some(txn) = db::find_by_saga_id(tx, saga_id).await? else {
        return Ok(());
    };

    if !db::is_refundable(txn.status) {
        return Ok(());
    }

    let gateway_transaction_id = txn.gateway_transaction_id.clone().unwrap_or_default();

    match gateway.refund(&gateway_transaction_id, txn.amount).await {
        Ok(result) => {
            db::set_refunded(tx, txn.transaction_id, &result.refund_id).await?;

            let envelope = EventEnvelope::new(
                EventType::PaymentRefunded,
                saga_id,
                "payment",
                PaymentRefunded {
                    order_id: txn.order_id,
                    transaction_id: txn.transaction_id,
                    refund_id: result.refund_id,
                    amount: txn.amount,
                    reason: reason.to_string(),
                },
            );

            outbox::enqueue(
                tx,
                envelope.event_id,
                EventType::PaymentRefunded.topic().as_str(),
                saga_id,
                &serde_json::to_value(&envelope).unwrap(),
            )
            .await?;
        }
        Err(error) => {
            tracing::error!(
                transaction_id = %txn.transaction_id,
                saga_id = %saga_id,
                error = %error,
                manual_intervention_required = true,
                "refund failed; transaction remains COMPLETED pending manual intervention"
            );
        }
    }

    Ok(())
}
