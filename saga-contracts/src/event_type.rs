use serde::{Deserialize, Serialize};

/// The closed set of event discriminators exchanged on the bus.
///
/// Reserved variants (marked `*` in the event taxonomy table) are not
/// produced by the baseline happy/compensation paths but are part of the
/// contract so downstream consumers can match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PaymentInitiated,
    OrderConfirmed,
    OrderCancelled,
    RiskCheckStarted,
    RiskCheckCompleted,
    RiskCheckFailed,
    RiskCheckRollback,
    PaymentProcessing,
    PaymentProcessed,
    PaymentFailed,
    PaymentRefunded,
    NotificationSent,
    NotificationFailed,
    SagaCompleted,
    SagaFailed,
    SagaTimeout,
}

/// The logical bus channel an [`EventType`] is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    PaymentSaga,
    RiskEvents,
    PaymentEvents,
    SagaCompensation,
    NotificationEvents,
    DeadLetter,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::PaymentSaga => "payment-saga",
            Topic::RiskEvents => "risk-events",
            Topic::PaymentEvents => "payment-events",
            Topic::SagaCompensation => "saga-compensation",
            Topic::NotificationEvents => "notification-events",
            Topic::DeadLetter => "dead-letter",
        }
    }
}

impl EventType {
    /// Maps an event type to the bus topic it is published on.
    ///
    /// Exhaustive with no wildcard arm: adding a variant without routing it
    /// fails the build instead of silently defaulting somewhere.
    pub fn topic(&self) -> Topic {
        match self {
            EventType::PaymentInitiated => Topic::PaymentSaga,
            EventType::OrderConfirmed => Topic::PaymentEvents,
            EventType::OrderCancelled => Topic::SagaCompensation,
            EventType::RiskCheckStarted => Topic::RiskEvents,
            EventType::RiskCheckCompleted => Topic::RiskEvents,
            EventType::RiskCheckFailed => Topic::RiskEvents,
            EventType::RiskCheckRollback => Topic::SagaCompensation,
            EventType::PaymentProcessing => Topic::PaymentEvents,
            EventType::PaymentProcessed => Topic::PaymentEvents,
            EventType::PaymentFailed => Topic::PaymentEvents,
            EventType::PaymentRefunded => Topic::SagaCompensation,
            EventType::NotificationSent => Topic::NotificationEvents,
            EventType::NotificationFailed => Topic::NotificationEvents,
            EventType::SagaCompleted => Topic::NotificationEvents,
            EventType::SagaFailed => Topic::NotificationEvents,
            EventType::SagaTimeout => Topic::NotificationEvents,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PaymentInitiated => "PAYMENT_INITIATED",
            EventType::OrderConfirmed => "ORDER_CONFIRMED",
            EventType::OrderCancelled => "ORDER_CANCELLED",
            EventType::RiskCheckStarted => "RISK_CHECK_STARTED",
            EventType::RiskCheckCompleted => "RISK_CHECK_COMPLETED",
            EventType::RiskCheckFailed => "RISK_CHECK_FAILED",
            EventType::RiskCheckRollback => "RISK_CHECK_ROLLBACK",
            EventType::PaymentProcessing => "PAYMENT_PROCESSING",
            EventType::PaymentProcessed => "PAYMENT_PROCESSED",
            EventType::PaymentFailed => "PAYMENT_FAILED",
            EventType::PaymentRefunded => "PAYMENT_REFUNDED",
            EventType::NotificationSent => "NOTIFICATION_SENT",
            EventType::NotificationFailed => "NOTIFICATION_FAILED",
            EventType::SagaCompleted => "SAGA_COMPLETED",
            EventType::SagaFailed => "SAGA_FAILED",
            EventType::SagaTimeout => "SAGA_TIMEOUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[EventType] = &[
        EventType::PaymentInitiated,
        EventType::OrderConfirmed,
        EventType::OrderCancelled,
        EventType::RiskCheckStarted,
        EventType::RiskCheckCompleted,
        EventType::RiskCheckFailed,
        EventType::RiskCheckRollback,
        EventType::PaymentProcessing,
        EventType::PaymentProcessed,
        EventType::PaymentFailed,
        EventType::PaymentRefunded,
        EventType::NotificationSent,
        EventType::NotificationFailed,
        EventType::SagaCompleted,
        EventType::SagaFailed,
        EventType::SagaTimeout,
    ];

    #[test]
    fn every_event_type_routes_to_a_topic() {
        for et in ALL {
            let _ = et.topic();
        }
    }

    #[test]
    fn forward_and_compensation_routing_matches_the_event_taxonomy() {
        assert_eq!(EventType::PaymentInitiated.topic(), Topic::PaymentSaga);
        assert_eq!(EventType::RiskCheckCompleted.topic(), Topic::RiskEvents);
        assert_eq!(EventType::RiskCheckFailed.topic(), Topic::RiskEvents);
        assert_eq!(EventType::RiskCheckRollback.topic(), Topic::SagaCompensation);
        assert_eq!(EventType::PaymentProcessed.topic(), Topic::PaymentEvents);
        assert_eq!(EventType::PaymentFailed.topic(), Topic::PaymentEvents);
        assert_eq!(EventType::PaymentRefunded.topic(), Topic::SagaCompensation);
        assert_eq!(EventType::OrderCancelled.topic(), Topic::SagaCompensation);
    }

    #[test]
    fn serde_round_trips_through_screaming_snake_case() {
        let json = serde_json::to_string(&EventType::RiskCheckCompleted).unwrap();
        assert_eq!(json, "\"RISK_CHECK_COMPLETED\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventType::RiskCheckCompleted);
    }
}
