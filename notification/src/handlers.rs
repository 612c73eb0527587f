use crate::adapter::NotificationAdapter;
use crate::dedup::NotificationDedup;
use crate::error::NotificationError;
use saga_contracts::payloads::{NotificationCategory, NotificationFailed, NotificationSent};
use saga_contracts::runtime::outbox;
use saga_contracts::{EventEnvelope, EventType};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

const CHANNEL: &str = "email";

/// Dedups by `(order_id, category)`, dispatches through the adapter, and
/// always emits an outcome event — emission failure is logged and reported
/// as `NOTIFICATION_FAILED`, never propagated as a handler error, since a
/// failed send must not block acknowledgment or retry the whole saga step.
pub async fn handle_notification(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    order_id: Uuid,
    category: NotificationCategory,
    message: String,
    dedup: &Arc<dyn NotificationDedup>,
    adapter: &Arc<dyn NotificationAdapter>,
) -> Result<(), NotificationError> {
    if dedup.already_sent(order_id, category).await {
        return Ok(());
    }

    let (event_id, topic, value) = match adapter.send(CHANNEL, &message).await {
        Ok(()) => {
            dedup.mark_sent(tx, order_id, category).await;
            let envelope = EventEnvelope::new(
                EventType::NotificationSent,
                saga_id,
                "notification",
                NotificationSent { order_id, category, channel: CHANNEL.to_string() },
            );
            (envelope.event_id, envelope.event_type.topic().as_str(), serde_json::to_value(&envelope).unwrap())
        }
        Err(error_message) => {
            tracing::error!(order_id = %order_id, ?category, error = %error_message, "notification dispatch failed");
            let envelope = EventEnvelope::new(
                EventType::NotificationFailed,
                saga_id,
                "notification",
                NotificationFailed { order_id, category, channel: CHANNEL.to_string(), error_message },
            );
            (envelope.event_id, envelope.event_type.topic().as_str(), serde_json::to_value(&envelope).unwrap())
        }
    };

    outbox::enqueue(tx, event_id, topic, saga_id, &value).await?;

    Ok(())
}
