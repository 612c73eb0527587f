use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("no cached amount/currency for saga {0}; PAYMENT_INITIATED may not have been processed yet")]
    MissingContext(uuid::Uuid),
}
