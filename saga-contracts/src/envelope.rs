//! Event envelope shared by every participant: `saga_id` as the partition
//! key, a closed `event_type` discriminator, and retry/timeout metadata
//! carried alongside the payload.

use crate::event_type::EventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-delivery bookkeeping carried alongside the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<serde_json::Value>,
}

fn default_max_retries() -> u32 {
    3
}

/// Expired events are still processed, never dropped on age alone.
fn default_timeout_ms() -> u64 {
    15_000
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            retry_count: 0,
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
            source: source.into(),
            additional_data: None,
        }
    }
}

/// Standard event envelope for every message on every topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub saga_id: Uuid,
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub metadata: EventMetadata,
    pub payload: T,
}

fn default_version() -> u32 {
    1
}

impl<T> EventEnvelope<T> {
    /// Construct a fresh envelope, filling `event_id`, `timestamp`, and
    /// `correlation_id` on publish.
    pub fn new(event_type: EventType, saga_id: Uuid, source: impl Into<String>, payload: T) -> Self {
        let event_id = Uuid::new_v4();
        Self {
            event_id,
            event_type,
            timestamp: Utc::now(),
            saga_id,
            correlation_id: event_id.to_string(),
            version: default_version(),
            metadata: EventMetadata::new(source),
            payload,
        }
    }

    /// Continue an existing causal chain: copies `correlation_id` across so
    /// it threads through the whole saga rather than resetting per hop.
    pub fn caused_by<U>(event_type: EventType, parent: &EventEnvelope<U>, payload: T) -> Self {
        let mut envelope = Self::new(event_type, parent.saga_id, parent.metadata.source.clone(), payload);
        envelope.correlation_id = parent.correlation_id.clone();
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_is_identity_modulo_defaulting() {
        let envelope = EventEnvelope::new(
            EventType::PaymentInitiated,
            Uuid::new_v4(),
            "order",
            json!({"orderId": "o-1"}),
        );

        let encoded = serde_json::to_string(&envelope).unwrap();
        let decoded: EventEnvelope<serde_json::Value> = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.event_id, envelope.event_id);
        assert_eq!(decoded.saga_id, envelope.saga_id);
        assert_eq!(decoded.event_type, envelope.event_type);
        assert_eq!(decoded.correlation_id, envelope.correlation_id);
        assert_eq!(decoded.metadata.max_retries, 3);
        assert_eq!(decoded.metadata.timeout_ms, 15_000);
    }

    #[test]
    fn missing_optional_metadata_defaults_on_decode() {
        let raw = json!({
            "event_id": Uuid::new_v4(),
            "event_type": "PAYMENT_INITIATED",
            "timestamp": Utc::now(),
            "saga_id": Uuid::new_v4(),
            "metadata": {"source": "order"},
            "payload": {}
        });

        let decoded: EventEnvelope<serde_json::Value> =
            serde_json::from_value(raw).expect("defaults fill gaps");
        assert_eq!(decoded.metadata.retry_count, 0);
        assert_eq!(decoded.metadata.max_retries, 3);
        assert_eq!(decoded.version, 1);
    }

    #[test]
    fn caused_by_copies_correlation_id_across_the_chain() {
        let initiated = EventEnvelope::new(
            EventType::PaymentInitiated,
            Uuid::new_v4(),
            "order",
            json!({}),
        );
        let completed = EventEnvelope::caused_by(
            EventType::RiskCheckCompleted,
            &initiated,
            json!({"approved": true}),
        );

        assert_eq!(completed.correlation_id, initiated.correlation_id);
        assert_eq!(completed.saga_id, initiated.saga_id);
        assert_ne!(completed.event_id, initiated.event_id);
    }
}
