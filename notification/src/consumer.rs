use crate::adapter::NotificationAdapter;
use crate::dedup::NotificationDedup;
use crate::handlers;
use async_trait::async_trait;
use event_bus::EventBus;
use futures::StreamExt;
use saga_contracts::payloads::NotificationCategory;
use saga_contracts::runtime::idempotency::IdempotentHandler;
use saga_contracts::runtime::{consume_one, handler_retry_config, process_idempotent};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

struct Notify {
    saga_id: Uuid,
    order_id: Uuid,
    category: NotificationCategory,
    message: String,
    dedup: Arc<dyn NotificationDedup>,
    adapter: Arc<dyn NotificationAdapter>,
}

#[async_trait]
impl IdempotentHandler for Notify {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
        handlers::handle_notification(
            tx,
            self.saga_id,
            self.order_id,
            self.category,
            self.message.clone(),
            &self.dedup,
            &self.adapter,
        )
        .await?;
        Ok(())
    }
}

async fn dispatch(
    pool: &PgPool,
    envelope: serde_json::Value,
    dedup: Arc<dyn NotificationDedup>,
    adapter: Arc<dyn NotificationAdapter>,
) -> anyhow::Result<bool> {
    let event_id: Uuid = envelope["event_id"].as_str().unwrap().parse()?;
    let saga_id: Uuid = envelope["saga_id"].as_str().unwrap().parse()?;
    let event_type = envelope["event_type"].as_str().unwrap_or_default();
    let payload = &envelope["payload"];

    let notify = |category: NotificationCategory, order_id: Uuid, message: String| Notify {
        saga_id,
        order_id,
        category,
        message,
        dedup: dedup.clone(),
        adapter: adapter.clone(),
    };

    let handled = match event_type {
        "PAYMENT_PROCESSED" => {
            let order_id: Uuid = payload["order_id"].as_str().unwrap().parse()?;
            let message = format!("Your payment for order {order_id} was processed successfully.");
            process_idempotent(pool, event_id, &notify(NotificationCategory::Success, order_id, message)).await?
        }
        "PAYMENT_FAILED" => {
            let order_id: Uuid = payload["order_id"].as_str().unwrap().parse()?;
            let reason = payload["reason"].as_str().unwrap_or_default();
            let message = format!("Your payment for order {order_id} failed: {reason}");
            process_idempotent(pool, event_id, &notify(NotificationCategory::Failure, order_id, message)).await?
        }
        "ORDER_CANCELLED" => {
            let order_id: Uuid = payload["order_id"].as_str().unwrap().parse()?;
            let reason = payload["reason"].as_str().unwrap_or_default();
            let message = format!("Your order {order_id} was cancelled: {reason}");
            process_idempotent(pool, event_id, &notify(NotificationCategory::Cancelled, order_id, message)).await?
        }
        "PAYMENT_REFUNDED" => {
            let order_id: Uuid = payload["order_id"].as_str().unwrap().parse()?;
            let amount = payload["amount"].as_f64().unwrap_or_default();
            let message = format!("A refund of {amount:.2} was issued for order {order_id}.");
            process_idempotent(pool, event_id, &notify(NotificationCategory::Refund, order_id, message)).await?
        }
        _ => false,
    };

    Ok(handled)
}

/// Subscribes to `payment-events` (success/failure outcomes) and
/// `saga-compensation` (cancellation/refund outcomes) — the two topics
/// that carry user-facing saga conclusions.
pub async fn start(
    bus: Arc<dyn EventBus>,
    pool: PgPool,
    dedup: Arc<dyn NotificationDedup>,
    adapter: Arc<dyn NotificationAdapter>,
) {
    for topic in ["payment-events", "saga-compensation"] {
        let bus = bus.clone();
        let pool = pool.clone();
        let dedup = dedup.clone();
        let adapter = adapter.clone();
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
                let dedup = dedup.clone();
                let adapter = adapter.clone();
                consume_one(&pool, &retry_config, &msg, |envelope| {
                    let pool = pool.clone();
                    let dedup = dedup.clone();
                    let adapter = adapter.clone();
                    async move { dispatch(&pool, envelope, dedup, adapter).await }
                })
                .await;
            }
        });
    }
}
