//! Consumer-side idempotency, ported from `modules/notifications/src/consumer.rs`'s
//! `process_idempotent` — the only copy in the reference pack that carries a
//! body rather than a stub.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Handler body run inside the same transaction that records the
/// idempotency marker, so "processed" and "state change committed" can
/// never disagree.
#[async_trait]
pub trait IdempotentHandler: Send + Sync {
    async fn handle(&self, tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()>;
}

pub async fn already_processed(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT event_id FROM processed_events WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(row.is_some())
}

pub async fn mark_processed(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO processed_events (event_id, processed_at) VALUES ($1, NOW()) \
         ON CONFLICT (event_id) DO NOTHING",
    )
    .bind(event_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Runs `handler` exactly once per `event_id`. Returns `Ok(false)` without
/// invoking `handler` if this event was already processed — the no-op path
/// that makes duplicate delivery harmless.
pub async fn process_idempotent(
    pool: &PgPool,
    event_id: Uuid,
    handler: &dyn IdempotentHandler,
) -> anyhow::Result<bool> {
    let mut tx = pool.begin().await?;

    if already_processed(&mut tx, event_id).await? {
        tx.rollback().await?;
        tracing::debug!(event_id = %event_id, "duplicate delivery, skipping");
        return Ok(false);
    }

    handler.handle(&mut tx).await?;
    mark_processed(&mut tx, event_id).await?;
    tx.commit().await?;

    Ok(true)
}
