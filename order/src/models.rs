use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states never transition further — confirmation and
    /// cancellation are both ends of the saga.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub user_id: String,
    pub saga_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_method: String,
    pub cancellation_reason: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The order status machine: `PENDING -> PROCESSING -> {CONFIRMED |
    /// CANCELLED}`, plus the direct `PENDING -> CANCELLED` edge taken when
    /// risk declines before payment ever starts processing. Refuses to
    /// move a record out of a terminal status — this is the single checked
    /// transition function standing in for ad hoc `if` chains scattered
    /// across handlers.
    pub fn transition(&self, next: OrderStatus) -> Result<OrderStatus, crate::error::OrderError> {
        use OrderStatus::*;

        if self.status.is_terminal() {
            return Err(crate::error::OrderError::TerminalState(next));
        }

        let allowed = matches!(
            (self.status, next),
            (Pending, Processing) | (Pending, Cancelled) | (Processing, Confirmed) | (Processing, Cancelled)
        );

        if allowed {
            Ok(next)
        } else {
            Err(crate::error::OrderError::TerminalState(next))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_status(status: OrderStatus) -> Order {
        Order {
            order_id: Uuid::new_v4(),
            user_id: "user-1".into(),
            saga_id: Uuid::new_v4(),
            amount: 10.0,
            currency: "USD".into(),
            status,
            payment_method: "card".into(),
            cancellation_reason: None,
            transaction_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pending_can_move_to_processing_or_cancelled() {
        let order = order_with_status(OrderStatus::Pending);
        assert!(order.transition(OrderStatus::Processing).is_ok());
        assert!(order.transition(OrderStatus::Cancelled).is_ok());
    }

    #[test]
    fn pending_cannot_skip_straight_to_confirmed() {
        let order = order_with_status(OrderStatus::Pending);
        assert!(order.transition(OrderStatus::Confirmed).is_err());
    }

    #[test]
    fn processing_can_reach_either_terminal_state() {
        let order = order_with_status(OrderStatus::Processing);
        assert!(order.transition(OrderStatus::Confirmed).is_ok());
        assert!(order.transition(OrderStatus::Cancelled).is_ok());
    }

    #[test]
    fn terminal_states_refuse_every_further_transition() {
        let confirmed = order_with_status(OrderStatus::Confirmed);
        assert!(confirmed.transition(OrderStatus::Cancelled).is_err());

        let cancelled = order_with_status(OrderStatus::Cancelled);
        assert!(cancelled.transition(OrderStatus::Processing).is_err());
    }
}
