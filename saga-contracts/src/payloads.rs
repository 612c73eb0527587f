//! Payload shapes for every event type participants actually construct.
//!
//! `order_id` appears in every payload for observability, but per the
//! compensation-lookup decision in `DESIGN.md`, handlers key their lookups on
//! the envelope's `saga_id`, never on `order_id` alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
}

/// Emitted by Order on `payment-saga` to kick off a new saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitiated {
    pub order_id: Uuid,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskChecks {
    pub fraud_check: bool,
    pub velocity_check: bool,
    pub blacklist_check: bool,
}

/// Emitted by Risk on `risk-events` when the assessment clears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCheckCompleted {
    pub order_id: Uuid,
    pub risk_score: u32,
    pub approved: bool,
    pub checks: RiskChecks,
}

/// Emitted by Risk on `risk-events` when the assessment cannot complete
/// (as opposed to completing with `approved = false`, which uses
/// [`RiskCheckCompleted`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCheckFailed {
    pub order_id: Uuid,
    pub reason: String,
    pub risk_score: u32,
}

/// Emitted by Risk on `saga-compensation` once a rollback has been applied
/// to a previously completed assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCheckRollback {
    pub order_id: Uuid,
    pub reason: String,
}

/// Emitted by Payment on `payment-events` after a successful gateway charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessed {
    pub order_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
}

/// Emitted by Payment on `payment-events` after a declined or exhausted
/// gateway charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailed {
    pub order_id: Uuid,
    pub reason: String,
    pub error_code: String,
}

/// Emitted by Payment on `saga-compensation` once a refund settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRefunded {
    pub order_id: Uuid,
    pub transaction_id: Uuid,
    pub refund_id: String,
    pub amount: f64,
    pub reason: String,
}

/// Emitted by Order (and by Risk's rollback edge) on `saga-compensation`
/// to unwind a saga. `order_id` is carried for observability only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: Uuid,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    Success,
    Failure,
    Cancelled,
    Refund,
}

/// Reserved outgoing event, emitted on `notification-events` after each
/// dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSent {
    pub order_id: Uuid,
    pub category: NotificationCategory,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFailed {
    pub order_id: Uuid,
    pub category: NotificationCategory,
    pub channel: String,
    pub error_message: String,
}
