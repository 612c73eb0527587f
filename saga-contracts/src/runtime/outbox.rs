//! Transactional outbox, ported from `modules/payments/src/events/outbox.rs`
//! and `modules/ar/src/events/publisher.rs`: handlers enqueue follow-on
//! events in the same transaction as their state write, and a background
//! poller drains the table onto the bus.

use event_bus::EventBus;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    topic: &str,
    saga_id: Uuid,
    envelope: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO outbox (event_id, topic, saga_id, payload, status, created_at)
        VALUES ($1, $2, $3, $4, 'pending', NOW())
        "#,
    )
    .bind(event_id)
    .bind(topic)
    .bind(saga_id)
    .bind(envelope)
    .execute(&mut **tx)
    .await?;

    tracing::debug!(event_id = %event_id, topic = %topic, "event enqueued to outbox");
    Ok(())
}

#[derive(sqlx::FromRow)]
struct OutboxRow {
    id: i64,
    event_id: Uuid,
    topic: String,
    saga_id: Uuid,
    payload: serde_json::Value,
}

/// Publishes up to 100 pending rows, oldest first. Rows whose publish fails
/// stay `pending` and are retried on the next tick rather than being marked
/// failed — the outbox has no terminal failure state, only eventual
/// delivery.
pub async fn publish_pending(pool: &PgPool, bus: &Arc<dyn EventBus>) -> Result<usize, sqlx::Error> {
    let rows: Vec<OutboxRow> = sqlx::query_as(
        r#"
        SELECT id, event_id, topic, saga_id, payload
        FROM outbox
        WHERE status = 'pending'
        ORDER BY id ASC
        LIMIT 100
        "#,
    )
    .fetch_all(pool)
    .await?;

    let count = rows.len();

    for row in rows {
        let bytes = match serde_json::to_vec(&row.payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(event_id = %row.event_id, error = %e, "outbox row payload is not serializable");
                continue;
            }
        };

        match bus
            .publish_keyed(&row.topic, &row.saga_id.to_string(), bytes)
            .await
        {
            Ok(()) => {
                sqlx::query("UPDATE outbox SET status = 'published', published_at = NOW() WHERE id = $1")
                    .bind(row.id)
                    .execute(pool)
                    .await?;
                tracing::info!(event_id = %row.event_id, topic = %row.topic, "event published from outbox");
            }
            Err(e) => {
                tracing::error!(event_id = %row.event_id, topic = %row.topic, error = %e, "failed to publish outbox row, will retry");
            }
        }
    }

    Ok(count)
}

/// Long-running poller, started once per participant binary.
pub async fn run_publisher(pool: PgPool, bus: Arc<dyn EventBus>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        if let Err(e) = publish_pending(&pool, &bus).await {
            tracing::error!(error = %e, "outbox publisher tick failed");
        }
    }
}
