use crate::handlers;
use async_trait::async_trait;
use event_bus::EventBus;
use futures::StreamExt;
use saga_contracts::payloads::{PaymentFailed as PaymentFailedPayload, RiskCheckCompleted, RiskCheckFailed};
use saga_contracts::runtime::idempotency::IdempotentHandler;
use saga_contracts::runtime::{consume_one, handler_retry_config, process_idempotent};
use saga_contracts::EventEnvelope;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

struct RiskCompleted {
    saga_id: Uuid,
    payload: RiskCheckCompleted,
}

#[async_trait]
impl IdempotentHandler for RiskCompleted {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_risk_check_completed(tx, self.saga_id, self.payload.clone()).await?;
        Ok(())
    }
}

struct RiskFailed {
    saga_id: Uuid,
    payload: RiskCheckFailed,
}

#[async_trait]
impl IdempotentHandler for RiskFailed {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_risk_check_failed(tx, self.saga_id, self.payload.clone()).await?;
        Ok(())
    }
}

struct PaymentProcessed {
    saga_id: Uuid,
    transaction_id: Uuid,
}

#[async_trait]
impl IdempotentHandler for PaymentProcessed {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_payment_processed(tx, self.saga_id, self.transaction_id).await?;
        Ok(())
    }
}

struct PaymentFailed {
    saga_id: Uuid,
    payload: PaymentFailedPayload,
}

#[async_trait]
impl IdempotentHandler for PaymentFailed {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_payment_failed(tx, self.saga_id, self.payload.clone()).await?;
        Ok(())
    }
}

async fn dispatch(pool: &PgPool, envelope: serde_json::Value) -> anyhow::Result<bool> {
    let event_id: Uuid = envelope["event_id"].as_str().unwrap().parse()?;
    let saga_id: Uuid = envelope["saga_id"].as_str().unwrap().parse()?;
    let event_type = envelope["event_type"].as_str().unwrap_or_default();

    let handled = match event_type {
        "RISK_CHECK_COMPLETED" => {
            let full: EventEnvelope<RiskCheckCompleted> = serde_json::from_value(envelope)?;
            process_idempotent(
                pool,
                event_id,
                &RiskCompleted { saga_id, payload: full.payload },
            )
            .await?
        }
        "RISK_CHECK_FAILED" => {
            let full: EventEnvelope<RiskCheckFailed> = serde_json::from_value(envelope)?;
            process_idempotent(
                pool,
                event_id,
                &RiskFailed { saga_id, payload: full.payload },
            )
            .await?
        }
        "PAYMENT_PROCESSED" => {
            let transaction_id: Uuid = envelope["payload"]["transaction_id"]
                .as_str()
                .unwrap()
                .parse()?;
            process_idempotent(pool, event_id, &PaymentProcessed { saga_id, transaction_id }).await?
        }
        "PAYMENT_FAILED" => {
            let full: EventEnvelope<PaymentFailedPayload> = serde_json::from_value(envelope)?;
            process_idempotent(pool, event_id, &PaymentFailed { saga_id, payload: full.payload }).await?
        }
        _ => false,
    };

    Ok(handled)
}

/// Subscribes to `risk-events` and `payment-events`, the two topics Order
/// reacts to on the way to confirming or cancelling a saga.
pub async fn start(bus: Arc<dyn EventBus>, pool: PgPool) {
    for topic in ["risk-events", "payment-events"] {
        let bus = bus.clone();
        let pool = pool.clone();
        let topic = topic.to_string();

        tokio::spawn(async move {
            let mut stream = match bus.subscribe(&topic).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(topic = %topic, error = %e, "failed to subscribe");
                    return;
                }
            };

            let retry_config = handler_retry_config();

            while let Some(msg) = stream.next().await {
                let pool = pool.clone();
                consume_one(&pool, &retry_config, &msg, |envelope| {
                    let pool = pool.clone();
                    async move { dispatch(&pool, envelope).await }
                })
                .await;
            }
        });
    }
}
