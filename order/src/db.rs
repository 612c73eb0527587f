use crate::models::{Order, OrderStatus};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    user_id: &str,
    saga_id: Uuid,
    amount: f64,
    currency: &str,
    payment_method: &str,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (order_id, user_id, saga_id, amount, currency, status, payment_method, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, NOW(), NOW())
        RETURNING order_id, user_id, saga_id, amount, currency, status, payment_method,
                  cancellation_reason, transaction_id, created_at, updated_at
        "#,
    )
    .bind(order_id)
    .bind(user_id)
    .bind(saga_id)
    .bind(amount)
    .bind(currency)
    .bind(payment_method)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_id(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        SELECT order_id, user_id, saga_id, amount, currency, status, payment_method,
               cancellation_reason, transaction_id, created_at, updated_at
        FROM orders
        WHERE order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_saga_id(
    tx: &mut Transaction<'_, Postgres>,
    saga_id: Uuid,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        SELECT order_id, user_id, saga_id, amount, currency, status, payment_method,
               cancellation_reason, transaction_id, created_at, updated_at
        FROM orders
        WHERE saga_id = $1
        FOR UPDATE
        "#,
    )
    .bind(saga_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE order_id = $2")
        .bind(status)
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn set_confirmed(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    transaction_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET status = 'CONFIRMED', transaction_id = $1, updated_at = NOW() WHERE order_id = $2",
    )
    .bind(transaction_id)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_cancelled(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    reason: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET status = 'CANCELLED', cancellation_reason = $1, updated_at = NOW() WHERE order_id = $2",
    )
    .bind(reason)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
