use crate::gateway::PaymentGateway;
use crate::handlers;
use async_trait::async_trait;
use event_bus::EventBus;
use futures::StreamExt;
use saga_contracts::payloads::{PaymentInitiated, RiskCheckCompleted};
use saga_contracts::runtime::idempotency::IdempotentHandler;
use saga_contracts::runtime::{consume_one, handler_retry_config, process_idempotent};
use saga_contracts::EventEnvelope;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

struct Initiated {
    saga_id: Uuid,
    order_id: Uuid,
    amount: f64,
    currency: String,
}

#[async_trait]
impl IdempotentHandler for Initiated {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_payment_initiated(tx, self.saga_id, self.order_id, self.amount, &self.currency).await?;
        Ok(())
    }
}

struct RiskCompleted {
    saga_id: Uuid,
    order_id: Uuid,
    approved: bool,
    gateway: Arc<dyn PaymentGateway>,
}

#[async_trait]
impl IdempotentHandler for RiskCompleted {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_risk_check_completed(tx, self.saga_id, self.order_id, self.approved, &self.gateway).await?;
        Ok(())
    }
}

struct Compensation {
    saga_id: Uuid,
    reason: String,
    gateway: Arc<dyn PaymentGateway>,
}

#[async_trait]
impl IdempotentHandler for Compensation {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_compensation(tx, self.saga_id, &self.reason, &self.gateway).await?;
        Ok(())
    }
}

async fn dispatch(pool: &PgPool, envelope: serde_json::Value, gateway: Arc<dyn PaymentGateway>) -> anyhow::Result<bool> {
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
                    amount: full.payload.amount,
                    currency: full.payload.currency,
                },
            )
            .await?
        }
        "RISK_CHECK_COMPLETED" => {
            let full: EventEnvelope<RiskCheckCompleted> = serde_json::from_value(envelope)?;
            process_idempotent(
                pool,
                event_id,
                &RiskCompleted {
                    saga_id,
                    order_id: full.payload.order_id,
                    approved: full.payload.approved,
                    gateway,
                },
            )
            .await?
        }
        "ORDER_CANCELLED" | "PAYMENT_FAILED" => {
            let reason = envelope["payload"]["reason"].as_str().unwrap_or_default().to_string();
            process_idempotent(pool, event_id, &Compensation { saga_id, reason, gateway }).await?
        }
        _ => false,
    };

    Ok(handled)
}

/// Subscribes to `payment-saga` (caching the amount/currency context),
/// `risk-events` (the forward charge trigger), and `saga-compensation`
/// (refund on order cancellation or payment failure — the latter guards
/// against a retried charge racing a second compensation).
pub async fn start(bus: Arc<dyn EventBus>, pool: PgPool, gateway: Arc<dyn PaymentGateway>) {
    for topic in ["payment-saga", "risk-events", "saga-compensation"] {
        let bus = bus.clone();
        let pool = pool.clone();
        let gateway = gateway.clone();
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
                let gateway = gateway.clone();
                consume_one(&pool, &retry_config, &msg, |envelope| {
                    let pool = pool.clone();
                    let gateway = gateway.clone();
                    async move { dispatch(&pool, envelope, gateway).await }
                })
                .await;
            }
        });
    }
}
