use crate::handlers;
use async_trait::async_trait;
use event_bus::EventBus;
use futures::StreamExt;
use saga_contracts::payloads::PaymentInitiated;
use saga_contracts::runtime::idempotency::IdempotentHandler;
use saga_contracts::runtime::{consume_one, handler_retry_config, process_idempotent};
use saga_contracts::EventEnvelope;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

struct Initiated {
    saga_id: Uuid,
    order_id: Uuid,
    user_id: String,
    amount: f64,
}

#[async_trait]
impl IdempotentHandler for Initiated {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_payment_initiated(tx, self.saga_id, self.order_id, &self.user_id, self.amount).await?;
        Ok(())
    }
}

struct Compensation {
    saga_id: Uuid,
    order_id: Uuid,
    reason: String,
}

#[async_trait]
impl IdempotentHandler for Compensation {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_compensation(tx, self.saga_id, self.order_id, self.reason.clone()).await?;
        Ok(())
    }
}

async fn dispatch(pool: &PgPool, envelope: serde_json::Value) -> anyhow::Result<bool> {
    let event_id: Uuid = envelope["event_id"].as_str().unwrap().parse()?;
    let saga_id: Uuid = envelope["saga_id"].as_str().unwrap().parse()?;
    let event_type = envelope["event_type"].as_str().unwrap_or_default();

    let handled = match event_type {
        "PAYMENT_INITIATED" => {
            let full: EventEnvelope<PaymentInitiated> = serde_json::from_value(envelope)?;
            process_idempotent(
                pool,
                event_id,
                &Initiated {
                    saga_id,
                    order_id: full.payload.order_id,
                    user_id: full.payload.user_id,
                    amount: full.payload.amount,
                },
            )
            .await?
        }
        "ORDER_CANCELLED" => {
            let order_id: Uuid = envelope["payload"]["order_id"].as_str().unwrap().parse()?;
            let reason = envelope["payload"]["reason"].as_str().unwrap_or_default().to_string();
            process_idempotent(pool, event_id, &Compensation { saga_id, order_id, reason }).await?
        }
        "PAYMENT_FAILED" => {
            let order_id: Uuid = envelope["payload"]["order_id"].as_str().unwrap().parse()?;
            let reason = envelope["payload"]["reason"].as_str().unwrap_or_default().to_string();
            process_idempotent(pool, event_id, &Compensation { saga_id, order_id, reason }).await?
        }
        _ => false,
    };

    Ok(handled)
}

/// Subscribes to `payment-saga` (the forward trigger) and
/// `saga-compensation` (rollback on order cancellation or payment failure).
pub async fn start(bus: Arc<dyn EventBus>, pool: PgPool) {
    for topic in ["payment-saga", "saga-compensation"] {
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
