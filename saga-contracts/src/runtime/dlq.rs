//! Dead-letter handling, ported in structure from
//! `modules/payments/src/events/dlq.rs` / `modules/ar/src/events/dlq.rs`.
//! A DLQ write failure is logged at `error` level and never blocks the
//! consumer loop — the partition keeps moving even if this message is lost.

use event_bus::BusMessage;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_failed_event(
    pool: &PgPool,
    event_id: Uuid,
    topic: &str,
    envelope: &serde_json::Value,
    error: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO failed_events (event_id, topic, payload, error, failed_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (event_id) DO UPDATE
        SET error = EXCLUDED.error,
            failed_at = NOW()
        "#,
    )
    .bind(event_id)
    .bind(topic)
    .bind(envelope)
    .bind(error)
    .execute(pool)
    .await?;

    tracing::error!(event_id = %event_id, topic = %topic, error = %error, "event moved to dead-letter queue");
    Ok(())
}

/// Extracts `event_id` from the raw message and writes it to `failed_events`.
/// Never panics or propagates: a message that can't even be parsed still
/// gets logged instead of silently disappearing.
pub async fn handle_processing_error(pool: &PgPool, msg: &BusMessage, error: &str) {
    let envelope: serde_json::Value = match serde_json::from_slice(&msg.payload) {
        Ok(envelope) => envelope,
        Err(parse_err) => {
            tracing::error!(
                subject = %msg.subject,
                error = %error,
                parse_error = %parse_err,
                "could not parse envelope for dead-letter queue"
            );
            return;
        }
    };

    let event_id = envelope
        .get("event_id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Uuid>().ok());

    let Some(event_id) = event_id else {
        tracing::error!(
            subject = %msg.subject,
            error = %error,
            "could not extract event_id for dead-letter queue"
        );
        return;
    };

    if let Err(dlq_err) = insert_failed_event(pool, event_id, &msg.subject, &envelope, error).await {
        tracing::error!(
            event_id = %event_id,
            subject = %msg.subject,
            error = %error,
            dlq_error = %dlq_err,
            "failed to write to dead-letter queue, event may be lost"
        );
    }
}
