use crate::models::{PaymentStatus, PaymentTransaction};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

pub async fn insert_processing(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: Uuid,
    order_id: Uuid,
    saga_id: Uuid,
    amount: f64,
    currency: &str,
) -> Result<PaymentTransaction, sqlx::Error> {
    sqlx::query_as::<_, PaymentTransaction>(
        r#"
        INSERT INTO payment_transactions
            (transaction_id, order_id, saga_id, amount, currency, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'PROCESSING', NOW(), NOW())
        RETURNING transaction_id, order_id, saga_id, amount, currency, status,
                  gateway_transaction_id, auth_code, refund_id, error_message, created_at, updated_at
        "#,
    )
    .bind(transaction_id)
    .bind(order_id)
    .bind(saga_id)
    .bind(amount)
    .bind(currency)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_saga_id(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    sqlx::query_as::<_, PaymentTransaction>(
        r#"
        SELECT transaction_id, order_id, saga_id, amount, currency, status,
               gateway_transaction_id, auth_code, refund_id, error_message, created_at, updated_at
        FROM payment_transactions
        WHERE saga_id = $1
        FOR UPDATE
        "#,
    )
    .bind(saga_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn set_completed(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: Uuid,
    gateway_transaction_id: &str,
    auth_code: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payment_transactions SET status = 'COMPLETED', gateway_transaction_id = $1, auth_code = $2, updated_at = NOW() WHERE transaction_id = $3",
    )
    .bind(gateway_transaction_id)
    .bind(auth_code)
    .bind(transaction_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_failed(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: Uuid,
    error_message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payment_transactions SET status = 'FAILED', error_message = $1, updated_at = NOW() WHERE transaction_id = $2",
    )
    .bind(error_message)
    .bind(transaction_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_refunded(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: Uuid,
    refund_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payment_transactions SET status = 'REFUNDED', refund_id = $1, updated_at = NOW() WHERE transaction_id = $2",
    )
    .bind(refund_id)
    .bind(transaction_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub fn is_refundable(status: PaymentStatus) -> bool {
    matches!(status, PaymentStatus::Completed)
}

/// Caches the amount/currency carried on `PAYMENT_INITIATED` so the
/// `RISK_CHECK_COMPLETED` handler — whose payload doesn't repeat them —
/// has what it needs to place a charge. Owned entirely by this
/// participant; never read or written by Order.
pub async fn upsert_context(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
    order_id: Uuid,
    amount: f64,
    currency: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payment_context (saga_id, order_id, amount, currency)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (saga_id) DO NOTHING
        "#,
    )
    .bind(saga_id)
    .bind(order_id)
    .bind(amount)
    .bind(currency)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_context(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
) -> Result<Option<(f64, String)>, sqlx::Error> {
    let row: Option<(f64, String)> = sqlx::query_as(
        "SELECT amount, currency FROM payment_context WHERE saga_id = $1",
    )
    .bind(saga_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row)
}
