use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
