use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// `FAILED` and `REFUNDED` are both terminal; `COMPLETED` is not
    /// terminal on its own merit — it is the only state compensation can
    /// still move out of, into `REFUNDED`.
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub transaction_id: Uuid,
    pub order_id: Uuid,
    pub saga_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_transaction_id: Option<String>,
    pub auth_code: Option<String>,
    pub refund_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
