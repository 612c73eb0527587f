use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("order not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("order is in a terminal state and cannot transition to {0:?}")]
    TerminalState(crate::models::OrderStatus),
}
