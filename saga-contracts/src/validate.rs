//! Structural validation of a raw envelope before it is trusted enough to
//! dispatch to a handler. Ported from `event_bus::envelope::validate_envelope_fields`
//! and generalized to this envelope's field set.

use crate::event_type::EventType;
use uuid::Uuid;

/// Checks `event_id` (UUID), `timestamp` (parseable), `saga_id` (non-empty
/// UUID), `event_type` (a known discriminator), and `payload` (present,
/// object-shaped). Anything that fails this check never reaches a handler —
/// it is routed straight to the dead-letter table instead.
pub fn validate_envelope_fields(envelope: &serde_json::Value) -> Result<(), String> {
    let event_id = envelope
        .get("event_id")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid event_id")?;
    event_id
        .parse::<Uuid>()
        .map_err(|_| "event_id is not a valid UUID".to_string())?;

    let timestamp = envelope
        .get("timestamp")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid timestamp")?;
    timestamp
        .parse::<chrono::DateTime<chrono::Utc>>()
        .map_err(|_| "timestamp is not a valid RFC 3339 datetime".to_string())?;

    let saga_id = envelope
        .get("saga_id")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid saga_id")?;
    saga_id
        .parse::<Uuid>()
        .map_err(|_| "saga_id is not a valid UUID".to_string())?;

    let event_type = envelope
        .get("event_type")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid event_type")?;
    known_event_type(event_type).ok_or_else(|| format!("unknown event_type: {event_type}"))?;

    match envelope.get("payload") {
        Some(serde_json::Value::Object(_)) => {}
        Some(_) => return Err("payload must be an object".to_string()),
        None => return Err("missing payload".to_string()),
    }

    Ok(())
}

fn known_event_type(raw: &str) -> Option<EventType> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_envelope() -> serde_json::Value {
        json!({
            "event_id": Uuid::new_v4().to_string(),
            "event_type": "PAYMENT_INITIATED",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "saga_id": Uuid::new_v4().to_string(),
            "metadata": {"source": "order"},
            "payload": {"order_id": Uuid::new_v4().to_string()},
        })
    }

    #[test]
    fn accepts_a_well_formed_envelope() {
        assert!(validate_envelope_fields(&valid_envelope()).is_ok());
    }

    #[test]
    fn rejects_malformed_event_id() {
        let mut envelope = valid_envelope();
        envelope["event_id"] = json!("not-a-uuid");
        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn rejects_unknown_event_type() {
        let mut envelope = valid_envelope();
        envelope["event_type"] = json!("SOMETHING_MADE_UP");
        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn rejects_non_object_payload() {
        let mut envelope = valid_envelope();
        envelope["payload"] = json!("not-an-object");
        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn rejects_missing_saga_id() {
        let mut envelope = valid_envelope();
        envelope.as_object_mut().unwrap().remove("saga_id");
        assert!(validate_envelope_fields(&envelope).is_err());
    }
}
